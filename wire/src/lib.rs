//! Wire envelope and codec shared by the progress sync, notification and chat services.
//!
//! Every message on the three real-time buses is a tagged record:
//!
//! ```json
//! {"type": "broadcast", "timestamp": "2024-05-01T10:00:00Z", "data": { ... }}
//! ```
//!
//! Decoding is two-step. [`Incoming::parse`] reads the discriminator and keeps
//! `data` as an undecoded JSON slice; the dispatch branch for that discriminator
//! then calls [`Incoming::payload`] with the exact payload type it expects. The
//! envelope parser therefore never needs to know every payload shape, and new
//! message kinds can be added without touching it.
//!
//! Each service owns its closed set of discriminators:
//!
//! - [`progress::ProgressKind`] for the stream-oriented progress sync bus
//! - [`notification::NotificationKind`] for the datagram notification bus
//! - [`chat::ChatKind`] for the room-partitioned chat hub

pub mod chat;
pub mod common;
pub mod envelope;
pub mod error;
pub mod notification;
pub mod progress;

pub use envelope::{encode, encode_at, Discriminator, Incoming};
pub use error::Error;
