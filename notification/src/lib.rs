//! Notification service: best-effort chapter-release datagrams.
//!
//! Clients register a self-chosen `client_id` over UDP and keep themselves
//! alive with pings. Every chapter release queued on the [`Notifier`] is sent
//! as one `notification` datagram to every live registrant.
//!
//! Registrants are keyed by `client_id`, not by address, so a client that
//! roams keeps its registration. Any datagram from a registrant's last known
//! address refreshes its `last_seen`; a periodic reaper removes registrants
//! that have been silent longer than the stale threshold.
//!
//! Delivery is fire-and-forget: failed sends are logged, never retried and
//! never cause eviction.

pub mod config;
pub mod error;
pub mod handler;
pub mod manager;
pub mod reaper;
pub mod registry;
pub mod server;

pub use config::NotificationConfig;
pub use error::Error;
pub use handler::NotificationEventHandler;
pub use manager::{Broadcaster, NotificationStats, Notifier};
pub use registry::{Registrant, RegistrantRegistry};
pub use server::NotificationServer;
