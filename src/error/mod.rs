//! Error types for the audit daemon.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
