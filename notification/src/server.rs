use crate::config::NotificationConfig;
use crate::error::Error;
use crate::manager::{Broadcaster, Notifier};
use crate::reaper;
use crate::registry::{Registrant, RegistrantRegistry};
use log::*;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{ToSocketAddrs, UdpSocket};
use tokio_util::sync::CancellationToken;
use wire::common::{ErrorCode, ErrorPayload, Ping, Pong};
use wire::error::ErrorKind as WireErrorKind;
use wire::notification::{
    NotificationKind, RegisterFailed, RegisterRequest, RegisterSuccess, UnregisterRequest,
};
use wire::{Discriminator, Incoming};

/// UDP front end of the notification service.
pub struct NotificationServer {
    socket: Arc<UdpSocket>,
    registry: Arc<RegistrantRegistry>,
    notifier: Notifier,
    broadcaster: Broadcaster,
    config: NotificationConfig,
}

impl NotificationServer {
    pub async fn bind(addr: impl ToSocketAddrs, config: NotificationConfig) -> Result<Self, Error> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        let registry = Arc::new(RegistrantRegistry::new());
        let (notifier, broadcaster) = Notifier::new(&config, registry.clone(), socket.clone());

        Ok(Self {
            socket,
            registry,
            notifier,
            broadcaster,
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }

    pub fn handle(&self) -> Notifier {
        self.notifier.clone()
    }

    /// Serves datagrams, the fan-out task and the reaper until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), Error> {
        let Self {
            socket,
            registry,
            notifier: _,
            broadcaster,
            config,
        } = self;

        info!(
            "Notification server listening on {}",
            socket.local_addr()?
        );

        let fan_out = tokio::spawn(broadcaster.run(cancel.clone()));
        let reaper = tokio::spawn(reaper::run(
            registry.clone(),
            config.reap_interval,
            config.stale_threshold,
            cancel.clone(),
        ));

        let mut buffer = vec![0u8; config.buffer_size];
        loop {
            let (len, peer) = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = socket.recv_from(&mut buffer) => match received {
                    Ok(received) => received,
                    Err(e) => {
                        warn!("Error reading datagram: {e}");
                        continue;
                    }
                },
            };

            handle_datagram(&socket, &registry, &buffer[..len], peer).await;
        }

        let _ = fan_out.await;
        let _ = reaper.await;

        info!("Notification server stopped");
        Ok(())
    }
}

async fn handle_datagram(
    socket: &UdpSocket,
    registry: &RegistrantRegistry,
    datagram: &[u8],
    peer: SocketAddr,
) {
    registry.touch(peer, Instant::now());

    let incoming = match Incoming::<NotificationKind>::parse(datagram) {
        Ok(incoming) => incoming,
        Err(e) => {
            debug!("Invalid datagram from {peer}: {e}");
            let error = match e.error_kind {
                WireErrorKind::UnknownMessageType(kind) => ErrorPayload::new(
                    ErrorCode::UnknownMessageType,
                    format!("Unknown message type: {kind}"),
                ),
                _ => ErrorPayload::new(ErrorCode::InvalidMessage, "Invalid message format"),
            };
            reply(socket, peer, NotificationKind::Error, &error).await;
            return;
        }
    };

    match incoming.kind {
        NotificationKind::Register => {
            let request = match incoming.payload::<RegisterRequest>() {
                Ok(request) if request.client_id.trim().is_empty() => {
                    return register_failed(socket, peer, "Client ID is required").await;
                }
                Ok(request) => request,
                Err(_) => {
                    return register_failed(socket, peer, "Invalid registration data").await;
                }
            };

            let client_id = request.client_id.clone();
            let is_new = registry.register(Registrant {
                client_id: request.client_id,
                user_id: request.user_id,
                username: request.username.clone(),
                addr: peer,
                last_seen: Instant::now(),
            });

            info!(
                "Client {} {client_id} (user: {}) from {peer} (total: {})",
                if is_new { "registered" } else { "re-registered" },
                request.username.as_deref().unwrap_or("-"),
                registry.len()
            );

            reply(
                socket,
                peer,
                NotificationKind::RegisterSuccess,
                &RegisterSuccess {
                    client_id,
                    message: "Registration successful".to_string(),
                },
            )
            .await;
        }
        NotificationKind::Unregister => match incoming.payload::<UnregisterRequest>() {
            Ok(request) => {
                if registry.unregister(&request.client_id).is_some() {
                    info!(
                        "Client unregistered: {} from {peer} (total: {})",
                        request.client_id,
                        registry.len()
                    );
                }
            }
            Err(_) => {
                let error = ErrorPayload::new(ErrorCode::InvalidData, "Invalid unregistration data");
                reply(socket, peer, NotificationKind::Error, &error).await;
            }
        },
        NotificationKind::Ping => {
            let ping: Ping = incoming.payload().unwrap_or_default();
            reply(socket, peer, NotificationKind::Pong, &Pong::reply_to(&ping)).await;
        }
        other => {
            let error = ErrorPayload::new(
                ErrorCode::UnknownMessageType,
                format!("Unknown message type: {}", other.as_str()),
            );
            reply(socket, peer, NotificationKind::Error, &error).await;
        }
    }
}

async fn register_failed(socket: &UdpSocket, peer: SocketAddr, reason: &str) {
    let failed = RegisterFailed {
        reason: reason.to_string(),
    };
    reply(socket, peer, NotificationKind::RegisterFailed, &failed).await;
}

async fn reply<T: Serialize>(socket: &UdpSocket, peer: SocketAddr, kind: NotificationKind, data: &T) {
    let frame = match wire::encode(kind, data) {
        Ok(frame) => frame,
        Err(e) => {
            error!("Failed to encode {} reply: {e}", kind.as_str());
            return;
        }
    };

    if let Err(e) = socket.send_to(frame.as_bytes(), peer).await {
        debug!("Failed to send {} to {peer}: {e}", kind.as_str());
    }
}
