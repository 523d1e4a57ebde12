//! Event bridge between the request-handling surface and the real-time fan-out services.
//!
//! This crate decouples synchronous state-mutation handlers from the
//! asynchronous buses that push changes to connected clients.
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum of the state transitions the real-time core fans out
//! - **Bridge**: Bounded, non-blocking ingress handed to mutation handlers
//! - **Relay**: Long-lived task draining the bridge into an `EventPublisher`
//! - **EventHandler**: Trait implemented by each fan-out service
//! - **EventPublisher**: Dispatches an event to the registered handlers
//!
//! A handler that has just persisted "user X advanced to chapter N" calls
//! [`Bridge::publish_progress`]. The call never waits: when the channel is
//! full the event is dropped with a diagnostic, because the broadcast is a
//! best-effort side channel rather than part of the mutation.

use async_trait::async_trait;
use std::sync::Arc;
use wire::notification::Notification;
use wire::progress::ProgressEvent;

pub mod bridge;
pub mod error;

pub use bridge::{Bridge, BridgeConfig, Relay};
pub use error::Error;

/// State transitions the real-time core turns into bus traffic.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A user's reading progress was persisted.
    /// Fanned out to every progress sync session.
    ProgressUpdated { progress: ProgressEvent },
    /// A new chapter was released.
    /// Fanned out to every live notification registrant and announced in chat.
    ChapterReleased { notification: Notification },
}

/// Trait for handling domain events.
/// Implementations hand the event to their own bounded ingress and must not block.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
