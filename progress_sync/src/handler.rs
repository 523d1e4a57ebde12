use crate::manager::ProgressSync;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;

/// Hands `ProgressUpdated` events to the progress sync ingress.
pub struct ProgressSyncEventHandler {
    sync: ProgressSync,
}

impl ProgressSyncEventHandler {
    pub fn new(sync: ProgressSync) -> Self {
        Self { sync }
    }
}

#[async_trait]
impl EventHandler for ProgressSyncEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        if let DomainEvent::ProgressUpdated { progress } = event {
            debug!(
                "Handling ProgressUpdated for user {} on {}",
                progress.user_id, progress.manga_id
            );
            // Overflow is already logged by the ingress.
            let _ = self.sync.broadcast(progress.clone());
        }
    }
}
