use crate::error::Error;
use crate::{DomainEvent, EventPublisher};
use log::*;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wire::notification::Notification;
use wire::progress::ProgressEvent;

pub const DEFAULT_BRIDGE_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Capacity of each of the two bridge channels.
    pub capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BRIDGE_CAPACITY,
        }
    }
}

/// Ingress side of the bridge, injected into state-mutation handlers.
///
/// Cloning is cheap; every clone feeds the same relay.
#[derive(Clone)]
pub struct Bridge {
    progress_tx: mpsc::Sender<ProgressEvent>,
    notification_tx: mpsc::Sender<Notification>,
}

/// Egress side of the bridge. Run it once with [`Relay::run`].
pub struct Relay {
    progress_rx: mpsc::Receiver<ProgressEvent>,
    notification_rx: mpsc::Receiver<Notification>,
}

impl Bridge {
    pub fn new(config: &BridgeConfig) -> (Bridge, Relay) {
        let (progress_tx, progress_rx) = mpsc::channel(config.capacity);
        let (notification_tx, notification_rx) = mpsc::channel(config.capacity);

        (
            Bridge {
                progress_tx,
                notification_tx,
            },
            Relay {
                progress_rx,
                notification_rx,
            },
        )
    }

    /// Queue a progress change for the progress sync bus. Never waits.
    pub fn publish_progress(&self, progress: ProgressEvent) -> Result<(), Error> {
        self.progress_tx.try_send(progress).map_err(|e| {
            let err = Error::from(e);
            warn!("Dropping progress event: {err}");
            err
        })
    }

    /// Queue a chapter release for the notification bus. Never waits.
    pub fn publish_notification(&self, notification: Notification) -> Result<(), Error> {
        self.notification_tx.try_send(notification).map_err(|e| {
            let err = Error::from(e);
            warn!("Dropping chapter notification: {err}");
            err
        })
    }

    /// Number of events waiting in each channel (progress, notification).
    pub fn queued(&self) -> (usize, usize) {
        (
            self.progress_tx.max_capacity() - self.progress_tx.capacity(),
            self.notification_tx.max_capacity() - self.notification_tx.capacity(),
        )
    }
}

impl Relay {
    /// Drains both channels into `publisher` until the token is cancelled or
    /// every `Bridge` clone has been dropped.
    pub async fn run(mut self, publisher: EventPublisher, cancel: CancellationToken) {
        info!("Event bridge relay started");

        let mut progress_open = true;
        let mut notification_open = true;

        while progress_open || notification_open {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("Event bridge relay cancelled");
                    break;
                }
                progress = self.progress_rx.recv(), if progress_open => match progress {
                    Some(progress) => {
                        publisher.publish(DomainEvent::ProgressUpdated { progress }).await;
                    }
                    None => progress_open = false,
                },
                notification = self.notification_rx.recv(), if notification_open => match notification {
                    Some(notification) => {
                        publisher.publish(DomainEvent::ChapterReleased { notification }).await;
                    }
                    None => notification_open = false,
                },
            }
        }

        info!("Event bridge relay stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::EventHandler;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};
    use wire::progress::ReadingStatus;

    fn progress(chapter: u32) -> ProgressEvent {
        ProgressEvent {
            user_id: "u1".to_string(),
            username: "alice".to_string(),
            manga_id: "m1".to_string(),
            manga_title: "Vagabond".to_string(),
            current_chapter: chapter,
            status: ReadingStatus::Reading,
            timestamp: Utc::now(),
        }
    }

    fn notification(chapter: u32) -> Notification {
        Notification {
            manga_id: "m1".to_string(),
            manga_title: "Vagabond".to_string(),
            chapter_number: chapter,
            chapter_title: None,
            release_date: Utc::now(),
            message: format!("Chapter {chapter} is out"),
        }
    }

    #[derive(Default)]
    struct Collector {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventHandler for Collector {
        async fn handle(&self, event: &DomainEvent) {
            let label = match event {
                DomainEvent::ProgressUpdated { progress } => {
                    format!("progress:{}", progress.current_chapter)
                }
                DomainEvent::ChapterReleased { notification } => {
                    format!("chapter:{}", notification.chapter_number)
                }
            };
            self.seen.lock().unwrap().push(label);
        }
    }

    #[test]
    fn overflow_drops_without_blocking() {
        let (bridge, _relay) = Bridge::new(&BridgeConfig { capacity: 100 });

        let started = Instant::now();
        let mut accepted = 0;
        let mut dropped = 0;
        for chapter in 0..10_000 {
            match bridge.publish_progress(progress(chapter)) {
                Ok(()) => accepted += 1,
                Err(e) => {
                    assert_eq!(e.error_kind, ErrorKind::QueueFull);
                    dropped += 1;
                }
            }
        }

        assert_eq!(accepted, 100);
        assert_eq!(dropped, 9_900);
        assert_eq!(bridge.queued(), (100, 0));
        assert!(started.elapsed() < Duration::from_secs(2));

        // Still accepting on the other channel.
        assert!(bridge.publish_notification(notification(1)).is_ok());
    }

    #[test]
    fn publishing_after_relay_is_gone_reports_closed() {
        let (bridge, relay) = Bridge::new(&BridgeConfig::default());
        drop(relay);

        let err = bridge.publish_notification(notification(1)).unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Closed);
    }

    #[tokio::test]
    async fn relay_forwards_both_channels_to_handlers() {
        let (bridge, relay) = Bridge::new(&BridgeConfig::default());
        let collector = Arc::new(Collector::default());
        let publisher = EventPublisher::new().with_handler(collector.clone());

        bridge.publish_progress(progress(7)).unwrap();
        bridge.publish_progress(progress(8)).unwrap();
        bridge.publish_notification(notification(9)).unwrap();
        drop(bridge);

        // All senders dropped: the relay drains what is queued and returns.
        tokio::time::timeout(
            Duration::from_secs(1),
            relay.run(publisher, CancellationToken::new()),
        )
        .await
        .expect("relay should exit once every bridge is dropped");

        let seen = collector.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 3);
        let progress_order: Vec<_> = seen.iter().filter(|s| s.starts_with("progress")).collect();
        assert_eq!(progress_order, vec!["progress:7", "progress:8"]);
        assert!(seen.contains(&"chapter:9".to_string()));
    }

    #[tokio::test]
    async fn relay_exits_on_cancellation() {
        let (_bridge, relay) = Bridge::new(&BridgeConfig::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(relay.run(EventPublisher::new(), cancel.clone()));

        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("relay should exit on cancellation")
            .unwrap();
    }
}
