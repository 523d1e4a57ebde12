use crate::config::NotificationConfig;
use crate::error::Error;
use crate::registry::RegistrantRegistry;
use log::*;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wire::notification::{Notification, NotificationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationStats {
    pub total_registrants: usize,
    pub ingress_queued: usize,
    pub buffer_size: usize,
}

/// Public handle of the notification service.
#[derive(Clone)]
pub struct Notifier {
    registry: Arc<RegistrantRegistry>,
    ingress: mpsc::Sender<Notification>,
    buffer_size: usize,
}

/// Fan-out task sending each queued notification to every registrant.
pub struct Broadcaster {
    registry: Arc<RegistrantRegistry>,
    ingress: mpsc::Receiver<Notification>,
    socket: Arc<UdpSocket>,
}

impl Notifier {
    pub fn new(
        config: &NotificationConfig,
        registry: Arc<RegistrantRegistry>,
        socket: Arc<UdpSocket>,
    ) -> (Notifier, Broadcaster) {
        let (tx, rx) = mpsc::channel(config.ingress_capacity);

        (
            Notifier {
                registry: registry.clone(),
                ingress: tx,
                buffer_size: config.buffer_size,
            },
            Broadcaster {
                registry,
                ingress: rx,
                socket,
            },
        )
    }

    /// Queues a notification for every live registrant without waiting.
    pub fn broadcast(&self, notification: Notification) -> Result<(), Error> {
        self.ingress.try_send(notification).map_err(|e| {
            let err = Error::from(e);
            warn!("Dropping chapter notification: {err}");
            err
        })
    }

    pub fn stats(&self) -> NotificationStats {
        NotificationStats {
            total_registrants: self.registry.len(),
            ingress_queued: self.ingress.max_capacity() - self.ingress.capacity(),
            buffer_size: self.buffer_size,
        }
    }

    pub fn registry(&self) -> &RegistrantRegistry {
        &self.registry
    }
}

impl Broadcaster {
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let notification = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                notification = self.ingress.recv() => match notification {
                    Some(notification) => notification,
                    None => break,
                },
            };

            self.dispatch(&notification).await;
        }

        debug!("Notification fan-out stopped");
    }

    /// Sends one datagram per registrant. Failures are logged and skipped.
    async fn dispatch(&self, notification: &Notification) -> usize {
        let frame = match wire::encode(NotificationKind::Notification, notification) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode notification: {e}");
                return 0;
            }
        };

        let addresses = self.registry.addresses();
        let mut delivered = 0;
        for addr in &addresses {
            match self.socket.send_to(frame.as_bytes(), *addr).await {
                Ok(_) => delivered += 1,
                Err(e) => warn!("Failed to send notification to {addr}: {e}"),
            }
        }

        info!(
            "Broadcasted notification to {delivered}/{} clients: {} - Chapter {}",
            addresses.len(),
            notification.manga_title,
            notification.chapter_number
        );
        delivered
    }
}
