//! Per-connection handler.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixStream;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditLevel, AuditLog, EventInput};
use crate::auth::{verify_peer, PeerInfo};
use crate::commands::{CommandParams, CommandRegistry, ExecutionContext};
use crate::config::Settings;
use crate::error::{DaemonError, ProtocolErrorKind};
use crate::protocol::{
    decode, encode, read_message_with_timeout, write_message_with_timeout, Request, Response,
};

use super::ConnectionMetrics;

/// Shared state every connection handler needs.
#[derive(Clone)]
pub struct ConnectionState {
    pub settings: Arc<Settings>,
    pub registry: Arc<CommandRegistry>,
    pub log: Arc<AuditLog>,
    pub metrics: Arc<ConnectionMetrics>,
}

/// Handle a single client connection.
pub async fn handle_connection(
    stream: UnixStream,
    state: ConnectionState,
) -> Result<(), DaemonError> {
    let peer = verify_peer(&stream, &state.settings.security.allowed_peer_uids)?;
    debug!(uid = peer.uid, gid = peer.gid, pid = peer.pid, "Peer authenticated");

    let (mut reader, mut writer) = stream.into_split();

    loop {
        let result = process_request(&mut reader, &mut writer, &state, &peer).await;

        match result {
            Ok(success) => state.metrics.record_request(success),
            Err(DaemonError::Protocol {
                kind: ProtocolErrorKind::ConnectionClosed,
            }) => {
                debug!(uid = peer.uid, "Client disconnected");
                return Ok(());
            }
            Err(DaemonError::Protocol {
                kind: ProtocolErrorKind::ConnectionTimeout,
            }) => {
                warn!(uid = peer.uid, "Connection timed out");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
}

/// Read one request, execute it and write the response.
///
/// Returns whether the request succeeded. Errors are reserved for the
/// connection itself (closed, timed out, oversized frame, I/O).
async fn process_request<R, W>(
    reader: &mut R,
    writer: &mut W,
    state: &ConnectionState,
    peer: &PeerInfo,
) -> Result<bool, DaemonError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let limits = &state.settings.limits;
    let socket_timeout = Duration::from_secs(limits.socket_timeout_seconds);
    let msg = read_message_with_timeout(reader, limits.max_message_size, socket_timeout).await?;

    let request_id = Uuid::new_v4();

    let response = match decode::<Request>(&msg) {
        Ok(request) => execute_request(state, peer, request_id, request).await,
        Err(e) => {
            warn!(request_id = %request_id, uid = peer.uid, error = %e, "Malformed request");
            Response::from_error(request_id, &e)
        }
    };

    let success = response.success;
    write_message_with_timeout(writer, &encode(&response)?, socket_timeout).await?;

    Ok(success)
}

async fn execute_request(
    state: &ConnectionState,
    peer: &PeerInfo,
    request_id: Uuid,
    request: Request,
) -> Response {
    let start_time = Instant::now();

    info!(
        request_id = %request_id,
        command = %request.command,
        uid = peer.uid,
        "Received request"
    );

    let requires_audit = state
        .registry
        .get(&request.command)
        .map(|cmd| cmd.requires_audit())
        .unwrap_or(false);
    let audited_params = requires_audit.then(|| request.params.clone());

    let ctx = ExecutionContext::new(request_id, peer.clone(), Utc::now(), request.command.clone());
    let params = CommandParams::new(request.params);
    let registry = Arc::clone(&state.registry);
    let command_name = request.command.clone();

    // Commands hold std mutexes; keep them off the async workers.
    let result =
        tokio::task::spawn_blocking(move || registry.dispatch(&ctx, &command_name, params)).await;

    let (response, outcome) = match result {
        Ok(Ok(cmd_result)) => {
            info!(
                request_id = %request_id,
                command = %request.command,
                "Command executed"
            );
            (
                Response::success(request_id, cmd_result.data.unwrap_or(serde_json::json!({}))),
                None,
            )
        }
        Ok(Err(e)) => {
            warn!(
                request_id = %request_id,
                command = %request.command,
                error = %e,
                "Command failed"
            );
            (Response::from_error(request_id, &e), Some(e.code()))
        }
        Err(e) => {
            error!(
                request_id = %request_id,
                command = %request.command,
                error = %e,
                "Command task panicked"
            );
            (
                Response::error(request_id, "INTERNAL_ERROR", "Command execution failed"),
                Some("INTERNAL_ERROR"),
            )
        }
    };

    if let Some(params) = audited_params {
        let duration_ms = start_time.elapsed().as_millis() as u64;
        record_admin_action(
            &state.log,
            peer,
            request_id,
            &request.command,
            params,
            outcome,
            duration_ms,
        );
    }

    response
}

/// Record an audited command invocation in the log itself.
///
/// Parameters go through the log's masking like any other details.
fn record_admin_action(
    log: &AuditLog,
    peer: &PeerInfo,
    request_id: Uuid,
    command: &str,
    params: serde_json::Value,
    error_code: Option<&str>,
    duration_ms: u64,
) {
    let level = if error_code.is_some() {
        AuditLevel::Warn
    } else {
        AuditLevel::Info
    };

    let details = serde_json::json!({
        "requestId": request_id,
        "params": params,
        "errorCode": error_code,
    });

    log.record(
        EventInput::new(command)
            .with_level(level)
            .with_category(AuditCategory::AdminAction)
            .with_actor(peer.actor_id(), None)
            .with_source_address(peer.source_address())
            .with_duration_ms(duration_ms)
            .with_details(&details),
    );
}
