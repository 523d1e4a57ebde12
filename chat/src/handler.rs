use crate::hub::Hub;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use wire::chat::ChatEvent;

/// Announces chapter releases as a system event in the default room.
pub struct ChatAnnouncer {
    hub: Hub,
}

impl ChatAnnouncer {
    pub fn new(hub: Hub) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl EventHandler for ChatAnnouncer {
    async fn handle(&self, event: &DomainEvent) {
        if let DomainEvent::ChapterReleased { notification } = event {
            let room = self.hub.default_room();
            debug!(
                "Announcing {} chapter {} in room {room}",
                notification.manga_title, notification.chapter_number
            );
            let _ = self.hub.broadcast(ChatEvent::system(
                room,
                format!(
                    "New Chapter Release: {} - Chapter {}!",
                    notification.manga_title, notification.chapter_number
                ),
            ));
        }
    }
}
