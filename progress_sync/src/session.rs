//! Per-connection handshake and read loop.

use crate::auth::{CredentialValidator, Identity};
use crate::config::SyncConfig;
use crate::error::{Error, ErrorKind};
use crate::manager::ProgressSync;
use crate::outbound::{self, Outbound};
use crate::registry::{ConnectionId, SessionHandle};
use chrono::Utc;
use futures::StreamExt;
use log::*;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use wire::common::{ErrorCode, Ping, Pong};
use wire::error::ErrorKind as WireErrorKind;
use wire::progress::{
    AuthFailed, AuthRequest, AuthSuccess, ProgressEvent, ProgressKind, ProgressUpdate,
};
use wire::{Discriminator, Incoming};

type LineReader = FramedRead<OwnedReadHalf, LinesCodec>;

const FIRST_MESSAGE_MUST_AUTH: &str = "First message must be authentication";

/// State shared by every session of one server.
pub(crate) struct SessionContext {
    pub(crate) sync: ProgressSync,
    pub(crate) validator: Arc<dyn CredentialValidator>,
    pub(crate) config: SyncConfig,
}

/// Drives one accepted connection from `Accepted` to `Closed`.
pub(crate) async fn run(
    stream: TcpStream,
    peer: SocketAddr,
    ctx: Arc<SessionContext>,
    shutdown: CancellationToken,
) {
    let (read_half, write_half) = stream.into_split();
    let mut reader = FramedRead::new(
        read_half,
        LinesCodec::new_with_max_length(ctx.config.max_line_length),
    );

    let closed = shutdown.child_token();
    let (outbound, writer) = outbound::spawn_writer(
        write_half,
        ctx.config.session_queue_capacity,
        ctx.config.write_timeout,
        closed.clone(),
    );

    debug!("Accepted progress sync connection from {peer}");

    match authenticate(&mut reader, &outbound, &ctx, &closed).await {
        Ok(identity) => serve(reader, outbound, identity, peer, &ctx, &closed).await,
        Err(e) => {
            info!("Closing connection from {peer} before authentication: {e}");
            drop(outbound);
        }
    }

    // The writer flushes whatever is still queued, then shuts the socket down.
    let _ = writer.await;
    debug!("Progress sync connection from {peer} closed");
}

async fn authenticate(
    reader: &mut LineReader,
    outbound: &Outbound,
    ctx: &SessionContext,
    closed: &CancellationToken,
) -> Result<Identity, Error> {
    let first = tokio::select! {
        _ = closed.cancelled() => return Err(Error::closed()),
        first = timeout(ctx.config.auth_timeout, reader.next()) => first,
    };

    let line = match first {
        Err(_elapsed) => {
            let _ = outbound.send_error(ErrorCode::AuthTimeout, "Authentication timeout");
            return Err(Error::new(ErrorKind::AuthTimeout));
        }
        Ok(None) => return Err(Error::closed()),
        Ok(Some(Err(e))) => {
            if matches!(e, LinesCodecError::MaxLineLengthExceeded) {
                let _ = outbound.send_error(ErrorCode::InvalidMessage, "Message too long");
            }
            return Err(e.into());
        }
        Ok(Some(Ok(line))) => line,
    };

    let incoming = match Incoming::<ProgressKind>::parse(&line) {
        Ok(incoming) if incoming.kind == ProgressKind::Auth => incoming,
        Ok(_)
        | Err(wire::Error {
            error_kind: WireErrorKind::UnknownMessageType(_),
            ..
        }) => return reject(outbound, FIRST_MESSAGE_MUST_AUTH),
        Err(e) => {
            let _ = outbound.send_error(ErrorCode::InvalidMessage, "Invalid message format");
            return Err(e.into());
        }
    };

    let request: AuthRequest = match incoming.payload() {
        Ok(request) => request,
        Err(_) => return reject(outbound, "Invalid authentication data"),
    };

    match ctx.validator.validate(&request.token).await {
        Ok(identity) => Ok(identity),
        Err(e) => {
            debug!("Credential rejected: {e}");
            reject(outbound, "Invalid or expired token")
        }
    }
}

fn reject(outbound: &Outbound, reason: &str) -> Result<Identity, Error> {
    let _ = outbound.send(
        ProgressKind::AuthFailed,
        &AuthFailed {
            reason: reason.to_string(),
        },
    );
    Err(Error::new(ErrorKind::AuthFailed(reason.to_string())))
}

async fn serve(
    mut reader: LineReader,
    outbound: Outbound,
    identity: Identity,
    peer: SocketAddr,
    ctx: &SessionContext,
    closed: &CancellationToken,
) {
    let greeting = match wire::encode(
        ProgressKind::AuthSuccess,
        &AuthSuccess {
            user_id: identity.user_id.clone(),
            username: identity.username.clone(),
            message: "Successfully authenticated".to_string(),
        },
    ) {
        Ok(greeting) => greeting,
        Err(e) => {
            error!("Failed to encode auth_success: {e}");
            return;
        }
    };

    let id = ConnectionId::new();
    let handle = SessionHandle::new(id.clone(), peer, identity.clone(), outbound.clone());
    if let Err(e) = ctx.sync.registry().add_after(handle, greeting.into()) {
        warn!("Could not admit session for {}: {e}", identity.username);
        return;
    }

    info!(
        "User {} ({}) authenticated from {peer}",
        identity.username, identity.user_id
    );

    // FramedRead yields a single `None` after a decoder error and resumes on the next poll.
    let mut after_decode_error = false;
    loop {
        let next = tokio::select! {
            _ = closed.cancelled() => {
                debug!("Session {} closed", id.as_str());
                break;
            }
            next = reader.next() => next,
        };

        match next {
            None if after_decode_error => after_decode_error = false,
            None => {
                debug!("User {} disconnected", identity.username);
                break;
            }
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                after_decode_error = true;
                let _ = outbound.send_error(ErrorCode::InvalidMessage, "Message too long");
            }
            Some(Err(LinesCodecError::Io(e))) => {
                debug!("Read from {peer} failed: {e}");
                break;
            }
            Some(Ok(line)) => {
                after_decode_error = false;
                handle_message(&line, &outbound, &identity, &ctx.sync);
            }
        }
    }

    ctx.sync.registry().remove(&id);
}

fn handle_message(line: &str, outbound: &Outbound, identity: &Identity, sync: &ProgressSync) {
    let incoming = match Incoming::<ProgressKind>::parse(line) {
        Ok(incoming) => incoming,
        Err(e) => {
            let _ = match e.error_kind {
                WireErrorKind::UnknownMessageType(kind) => outbound.send_error(
                    ErrorCode::UnknownMessageType,
                    format!("Unknown message type: {kind}"),
                ),
                _ => outbound.send_error(ErrorCode::InvalidMessage, "Invalid message format"),
            };
            return;
        }
    };

    match incoming.kind {
        ProgressKind::Ping => {
            let ping: Ping = incoming.payload().unwrap_or_default();
            let _ = outbound.send(ProgressKind::Pong, &Pong::reply_to(&ping));
        }
        ProgressKind::Progress => match incoming.payload::<ProgressUpdate>() {
            Ok(update) => {
                let progress = ProgressEvent {
                    user_id: identity.user_id.clone(),
                    username: identity.username.clone(),
                    manga_id: update.manga_id,
                    manga_title: String::new(),
                    current_chapter: update.current_chapter,
                    status: update.status.unwrap_or_default(),
                    timestamp: Utc::now(),
                };
                info!(
                    "Progress from {}: {} chapter {}",
                    identity.username, progress.manga_id, progress.current_chapter
                );
                let _ = sync.broadcast(progress);
            }
            Err(_) => {
                let _ = outbound.send_error(ErrorCode::InvalidData, "Invalid progress data");
            }
        },
        other => {
            let _ = outbound.send_error(
                ErrorCode::UnknownMessageType,
                format!("Unknown message type: {}", other.as_str()),
            );
        }
    }
}
