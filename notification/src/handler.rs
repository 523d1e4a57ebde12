use crate::manager::Notifier;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;

/// Hands `ChapterReleased` events to the notification fan-out.
pub struct NotificationEventHandler {
    notifier: Notifier,
}

impl NotificationEventHandler {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl EventHandler for NotificationEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        if let DomainEvent::ChapterReleased { notification } = event {
            debug!(
                "Handling ChapterReleased for {} chapter {}",
                notification.manga_id, notification.chapter_number
            );
            let _ = self.notifier.broadcast(notification.clone());
        }
    }
}
