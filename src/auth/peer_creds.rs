//! Peer credential verification.
//!
//! Only processes running as an allowed UID (typically the web
//! application's service account) may talk to the daemon.

use std::os::fd::AsFd;

use crate::error::{AuthErrorKind, DaemonError};

/// Information about the connected peer.
#[derive(Debug, Clone)]
pub struct PeerInfo {
    /// User ID of the peer process.
    pub uid: u32,
    /// Group ID of the peer process.
    pub gid: u32,
    /// Process ID of the peer process (0 where the platform does not report it).
    pub pid: i32,
}

impl PeerInfo {
    /// Actor id used when the daemon audits its own admin commands.
    pub fn actor_id(&self) -> String {
        format!("uid:{}", self.uid)
    }

    /// Source address used when the daemon audits its own admin commands.
    pub fn source_address(&self) -> String {
        format!("unix:pid:{}", self.pid)
    }
}

/// Verify that the peer is authorized to connect.
///
/// Returns the peer info if its UID is in `allowed_uids`. An empty list
/// rejects everyone.
pub fn verify_peer<S: AsFd>(stream: &S, allowed_uids: &[u32]) -> Result<PeerInfo, DaemonError> {
    let peer = peer_credentials(stream)?;
    authorize(peer, allowed_uids)
}

/// Check a peer against the UID allowlist.
pub fn authorize(peer: PeerInfo, allowed_uids: &[u32]) -> Result<PeerInfo, DaemonError> {
    // Fail closed on an empty list
    if allowed_uids.is_empty() || !allowed_uids.contains(&peer.uid) {
        return Err(DaemonError::Auth {
            kind: AuthErrorKind::UnauthorizedPeer { uid: peer.uid },
        });
    }
    Ok(peer)
}

#[cfg(target_os = "linux")]
fn peer_credentials<S: AsFd>(stream: &S) -> Result<PeerInfo, DaemonError> {
    use nix::sys::socket::{getsockopt, sockopt::PeerCredentials};

    let creds = getsockopt(stream, PeerCredentials).map_err(|e| DaemonError::Socket {
        message: format!("Failed to get peer credentials: {}", e),
    })?;

    Ok(PeerInfo {
        uid: creds.uid(),
        gid: creds.gid(),
        pid: creds.pid(),
    })
}

#[cfg(not(target_os = "linux"))]
fn peer_credentials<S: AsFd>(stream: &S) -> Result<PeerInfo, DaemonError> {
    let (uid, gid) = nix::unistd::getpeereid(stream.as_fd()).map_err(|e| DaemonError::Socket {
        message: format!("Failed to get peer credentials: {}", e),
    })?;

    Ok(PeerInfo {
        uid: uid.as_raw(),
        gid: gid.as_raw(),
        pid: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(uid: u32) -> PeerInfo {
        PeerInfo {
            uid,
            gid: uid,
            pid: 4242,
        }
    }

    #[test]
    fn test_allowed_uid() {
        let result = authorize(peer(33), &[33, 1000]);
        assert_eq!(result.unwrap().uid, 33);
    }

    #[test]
    fn test_disallowed_uid() {
        let result = authorize(peer(1001), &[33, 1000]);
        assert!(matches!(
            result,
            Err(DaemonError::Auth {
                kind: AuthErrorKind::UnauthorizedPeer { uid: 1001 }
            })
        ));
    }

    #[test]
    fn test_empty_allowlist_rejects_everyone() {
        assert!(authorize(peer(0), &[]).is_err());
    }

    #[test]
    fn test_actor_identity() {
        let p = peer(33);
        assert_eq!(p.actor_id(), "uid:33");
        assert_eq!(p.source_address(), "unix:pid:4242");
    }

    #[test]
    fn test_verify_socket_pair() {
        let (a, _b) = std::os::unix::net::UnixStream::pair().unwrap();
        let uid = nix::unistd::getuid().as_raw();
        let info = verify_peer(&a, &[uid]).unwrap();
        assert_eq!(info.uid, uid);
        assert!(verify_peer(&a, &[uid.wrapping_add(1)]).is_err());
    }
}
