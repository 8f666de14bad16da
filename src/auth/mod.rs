//! Authentication module.
//!
//! Handles peer credential verification for socket clients.

mod peer_creds;

pub use peer_creds::{authorize, verify_peer, PeerInfo};
