use crate::config::SyncConfig;
use crate::error::Error;
use crate::registry::SessionRegistry;
use log::*;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wire::progress::{ProgressEvent, ProgressKind};

/// Point-in-time counters for the admin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub total_sessions: usize,
    pub total_users: usize,
    pub ingress_queued: usize,
}

/// Public handle of the progress sync service.
///
/// Cheap to clone; every clone shares the registry and the ingress queue.
#[derive(Clone)]
pub struct ProgressSync {
    registry: Arc<SessionRegistry>,
    ingress: mpsc::Sender<ProgressEvent>,
}

/// The single task that dispatches queued events to every session.
pub struct FanOut {
    registry: Arc<SessionRegistry>,
    ingress: mpsc::Receiver<ProgressEvent>,
}

impl ProgressSync {
    pub fn new(config: &SyncConfig) -> (ProgressSync, FanOut) {
        let registry = Arc::new(SessionRegistry::new());
        let (tx, rx) = mpsc::channel(config.ingress_capacity);

        (
            ProgressSync {
                registry: registry.clone(),
                ingress: tx,
            },
            FanOut {
                registry,
                ingress: rx,
            },
        )
    }

    /// Queues an event for delivery to every authenticated session.
    ///
    /// Never waits. When the ingress is full the event is dropped and
    /// `QueueFull` is returned.
    pub fn broadcast(&self, progress: ProgressEvent) -> Result<(), Error> {
        self.ingress.try_send(progress).map_err(|e| {
            let err = Error::from(e);
            warn!("Dropping progress broadcast: {err}");
            err
        })
    }

    /// Sends an event to every session of one user, bypassing the ingress.
    /// Returns the number of sessions it was queued for.
    pub fn send_to_user(&self, user_id: &str, progress: &ProgressEvent) -> Result<usize, Error> {
        let frame: Arc<str> = wire::encode(ProgressKind::Broadcast, progress)?.into();
        let sessions = self.registry.sessions_for_user(user_id);

        let delivered = sessions
            .iter()
            .filter(|session| match session.enqueue(frame.clone()) {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        "Failed to queue event for session {} of user {user_id}: {e}",
                        session.id.as_str()
                    );
                    false
                }
            })
            .count();

        debug!(
            "Sent progress event to {delivered}/{} session(s) of user {user_id}",
            sessions.len()
        );
        Ok(delivered)
    }

    pub fn stats(&self) -> SyncStats {
        let (total_sessions, total_users) = self.registry.counts();
        SyncStats {
            total_sessions,
            total_users,
            ingress_queued: self.ingress.max_capacity() - self.ingress.capacity(),
        }
    }

    pub(crate) fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}

impl FanOut {
    /// Drains the ingress until cancelled or until every [`ProgressSync`]
    /// handle is dropped. Events are dispatched one at a time, in order.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let progress = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                progress = self.ingress.recv() => match progress {
                    Some(progress) => progress,
                    None => break,
                },
            };

            self.dispatch(&progress);
        }

        debug!("Progress fan-out stopped");
    }

    /// Queues one event on every session's outbound queue.
    ///
    /// Enqueueing never waits; a session whose queue is full is closed
    /// without affecting delivery to the others.
    fn dispatch(&self, progress: &ProgressEvent) -> usize {
        let frame: Arc<str> = match wire::encode(ProgressKind::Broadcast, progress) {
            Ok(frame) => frame.into(),
            Err(e) => {
                error!("Failed to encode progress broadcast: {e}");
                return 0;
            }
        };

        let sessions = self.registry.snapshot();
        let mut delivered = 0;
        for session in &sessions {
            match session.enqueue(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    "Dropping session {} ({}) from broadcast: {e}",
                    session.id.as_str(),
                    session.username
                ),
            }
        }

        debug!(
            "Broadcasted progress of {} on {} to {delivered}/{} session(s)",
            progress.username,
            progress.manga_id,
            sessions.len()
        );
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::error::ErrorKind;
    use crate::outbound::Outbound;
    use crate::registry::{ConnectionId, SessionHandle};
    use chrono::Utc;
    use wire::progress::ReadingStatus;

    fn progress(chapter: u32) -> ProgressEvent {
        ProgressEvent {
            user_id: "u-1".to_string(),
            username: "alice".to_string(),
            manga_id: "one-piece".to_string(),
            manga_title: "One Piece".to_string(),
            current_chapter: chapter,
            status: ReadingStatus::Reading,
            timestamp: Utc::now(),
        }
    }

    fn session(
        user_id: &str,
        capacity: usize,
    ) -> (SessionHandle, mpsc::Receiver<Arc<str>>, CancellationToken) {
        let (tx, rx) = mpsc::channel(capacity);
        let closed = CancellationToken::new();
        let identity = Identity {
            user_id: user_id.to_string(),
            username: user_id.to_string(),
        };
        let handle = SessionHandle::new(
            ConnectionId::new(),
            "127.0.0.1:4242".parse().unwrap(),
            identity,
            Outbound::new(tx, closed.clone()),
        );
        (handle, rx, closed)
    }

    fn chapter_of(frame: &str) -> u64 {
        let value: serde_json::Value = serde_json::from_str(frame).unwrap();
        assert_eq!(value["type"], "broadcast");
        value["data"]["current_chapter"].as_u64().unwrap()
    }

    #[test]
    fn slow_session_is_closed_without_affecting_others() {
        let config = SyncConfig::default();
        let (sync, fan_out) = ProgressSync::new(&config);

        let (slow, _slow_rx, slow_closed) = session("slow", 4);
        let (fast, mut fast_rx, fast_closed) = session("fast", 64);
        sync.registry().add(slow);
        sync.registry().add(fast);

        for chapter in 1..=10 {
            fan_out.dispatch(&progress(chapter));
        }

        assert!(slow_closed.is_cancelled());
        assert!(!fast_closed.is_cancelled());

        let mut received = Vec::new();
        while let Ok(frame) = fast_rx.try_recv() {
            received.push(chapter_of(&frame));
        }
        assert_eq!(received, (1..=10).collect::<Vec<u64>>());
    }

    #[test]
    fn broadcast_overflow_returns_queue_full() {
        let config = SyncConfig {
            ingress_capacity: 2,
            ..SyncConfig::default()
        };
        let (sync, _fan_out) = ProgressSync::new(&config);

        sync.broadcast(progress(1)).unwrap();
        sync.broadcast(progress(2)).unwrap();
        let err = sync.broadcast(progress(3)).unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::QueueFull);
        assert_eq!(sync.stats().ingress_queued, 2);
    }

    #[test]
    fn broadcast_after_fan_out_stops_returns_closed() {
        let (sync, fan_out) = ProgressSync::new(&SyncConfig::default());
        drop(fan_out);

        let err = sync.broadcast(progress(1)).unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Closed);
    }

    #[test]
    fn send_to_user_reaches_only_that_users_sessions() {
        let (sync, _fan_out) = ProgressSync::new(&SyncConfig::default());
        let (phone, mut phone_rx, _) = session("alice", 8);
        let (laptop, mut laptop_rx, _) = session("alice", 8);
        let (other, mut other_rx, _) = session("bob", 8);
        sync.registry().add(phone);
        sync.registry().add(laptop);
        sync.registry().add(other);

        let delivered = sync.send_to_user("alice", &progress(7)).unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(chapter_of(&phone_rx.try_recv().unwrap()), 7);
        assert_eq!(chapter_of(&laptop_rx.try_recv().unwrap()), 7);
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn fan_out_preserves_publication_order() {
        let (sync, fan_out) = ProgressSync::new(&SyncConfig::default());
        let (handle, mut rx, _) = session("alice", 128);
        sync.registry().add(handle);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(fan_out.run(cancel.clone()));

        for chapter in 1..=50 {
            sync.broadcast(progress(chapter)).unwrap();
        }

        let mut received = Vec::new();
        while received.len() < 50 {
            let frame = rx.recv().await.unwrap();
            received.push(chapter_of(&frame));
        }
        assert_eq!(received, (1..=50).collect::<Vec<u64>>());

        cancel.cancel();
        task.await.unwrap();
    }
}
