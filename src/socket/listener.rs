//! Unix socket listener.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UnixListener;
use tokio::sync::{Notify, Semaphore};
use tracing::{debug, error, info, warn};

use crate::audit::AuditLog;
use crate::commands::CommandRegistry;
use crate::config::Settings;
use crate::error::{DaemonError, ProtocolErrorKind};

use super::connection::{handle_connection, ConnectionState};

/// Connection metrics for monitoring.
#[derive(Debug, Default)]
pub struct ConnectionMetrics {
    /// Total requests processed.
    pub requests_total: AtomicU64,
    /// Total failed requests.
    pub requests_failed: AtomicU64,
    /// Currently active connections.
    pub active_connections: AtomicUsize,
}

impl ConnectionMetrics {
    /// Create new connection metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a processed request.
    pub fn record_request(&self, success: bool) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get total request count.
    pub fn total_requests(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Get failed request count.
    pub fn failed_requests(&self) -> u64 {
        self.requests_failed.load(Ordering::Relaxed)
    }

    /// Get active connection count.
    pub fn active(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }
}

/// Unix socket server.
pub struct SocketListener {
    listener: UnixListener,
    state: ConnectionState,
    /// Semaphore for connection limiting
    connection_semaphore: Arc<Semaphore>,
}

impl SocketListener {
    /// Create and bind a new socket listener serving `log`.
    pub async fn bind(settings: Arc<Settings>, log: Arc<AuditLog>) -> Result<Self, DaemonError> {
        let socket_path = &settings.socket.path;

        // Refuse to unlink through a symlink
        if let Ok(metadata) = std::fs::symlink_metadata(socket_path) {
            if metadata.file_type().is_symlink() {
                return Err(DaemonError::Socket {
                    message: format!(
                        "Socket path {} is a symlink, refusing to remove it",
                        socket_path.display()
                    ),
                });
            }

            std::fs::remove_file(socket_path).map_err(|e| DaemonError::Socket {
                message: format!(
                    "Failed to remove existing socket file {}: {}",
                    socket_path.display(),
                    e
                ),
            })?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DaemonError::Socket {
                message: format!(
                    "Failed to create socket directory {}: {}",
                    parent.display(),
                    e
                ),
            })?;
        }

        let listener = UnixListener::bind(socket_path).map_err(|e| DaemonError::Socket {
            message: format!("Failed to bind to socket {}: {}", socket_path.display(), e),
        })?;

        Self::set_socket_permissions(socket_path, &settings.socket.permissions)?;

        if settings.security.allowed_peer_uids.is_empty() {
            warn!("No allowed peer UIDs configured, every connection will be rejected");
        }

        let metrics = Arc::new(ConnectionMetrics::new());

        let connection_semaphore = Arc::new(Semaphore::new(settings.limits.max_concurrent_requests));
        info!(
            max_connections = settings.limits.max_concurrent_requests,
            "Connection limiting enabled"
        );

        let registry = Arc::new(CommandRegistry::new(
            Arc::clone(&log),
            Some(Arc::clone(&metrics)),
        ));

        info!(
            path = %socket_path.display(),
            "Socket listener bound"
        );

        Ok(Self {
            listener,
            state: ConnectionState {
                settings,
                registry,
                log,
                metrics,
            },
            connection_semaphore,
        })
    }

    /// Get connection metrics.
    pub fn metrics(&self) -> Arc<ConnectionMetrics> {
        Arc::clone(&self.state.metrics)
    }

    /// Set socket file permissions.
    fn set_socket_permissions(path: &Path, permissions_str: &str) -> Result<(), DaemonError> {
        let mode = u32::from_str_radix(permissions_str, 8).map_err(|e| DaemonError::Socket {
            message: format!("Invalid socket permissions '{}': {}", permissions_str, e),
        })?;

        let permissions = std::fs::Permissions::from_mode(mode);
        std::fs::set_permissions(path, permissions).map_err(|e| DaemonError::Socket {
            message: format!(
                "Failed to set socket permissions on {}: {}",
                path.display(),
                e
            ),
        })?;

        Ok(())
    }

    /// Run the socket listener, accepting connections.
    ///
    /// Stops accepting when `shutdown` is notified. Connections already
    /// accepted run until the client disconnects or times out.
    pub async fn run(&self, shutdown: Arc<Notify>) -> Result<(), DaemonError> {
        info!("Socket listener running, waiting for connections...");

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, _addr)) => {
                            let permit = match self.connection_semaphore.clone().try_acquire_owned() {
                                Ok(permit) => permit,
                                Err(_) => {
                                    warn!(
                                        max = self.state.settings.limits.max_concurrent_requests,
                                        "Connection limit reached, rejecting connection"
                                    );
                                    continue;
                                }
                            };

                            let state = self.state.clone();
                            let metrics = Arc::clone(&self.state.metrics);

                            metrics.active_connections.fetch_add(1, Ordering::Relaxed);
                            debug!(
                                active = metrics.active(),
                                "New connection accepted"
                            );

                            tokio::spawn(async move {
                                // Released when the connection task ends
                                let _permit = permit;
                                if let Err(e) = handle_connection(stream, state).await {
                                    match &e {
                                        DaemonError::Auth { .. } => {
                                            warn!(error = %e, "Connection rejected");
                                        }
                                        DaemonError::Protocol {
                                            kind: ProtocolErrorKind::ConnectionClosed,
                                        } => {}
                                        _ => error!(error = %e, "Connection handler error"),
                                    }
                                }

                                metrics.active_connections.fetch_sub(1, Ordering::Relaxed);
                                debug!(active = metrics.active(), "Connection closed");
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = shutdown.notified() => {
                    info!("Shutdown signal received, stopping listener");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Wait for all active connections to drain, up to `max_wait`.
    ///
    /// Returns whether every connection closed in time.
    pub async fn wait_for_drain(&self, max_wait: Duration) -> bool {
        let poll_interval = Duration::from_millis(100);
        let deadline = tokio::time::Instant::now() + max_wait;

        while self.state.metrics.active() > 0 {
            if tokio::time::Instant::now() >= deadline {
                warn!(
                    active = self.state.metrics.active(),
                    "Connections still open after drain timeout"
                );
                return false;
            }
            debug!(
                active = self.state.metrics.active(),
                "Waiting for connections to drain"
            );
            tokio::time::sleep(poll_interval).await;
        }

        info!("All connections drained");
        true
    }
}
