//! Chat hub: room-partitioned broadcast over WebSocket.
//!
//! A single hub task owns the room map. Member connections never touch it
//! directly; they send register, unregister and request commands to the hub,
//! and receive encoded frames through their own bounded outbound queue.
//!
//! A member whose queue is full is evicted: the hub drops its queue, the
//! member's writer sees the queue close and ends the connection.

pub mod config;
pub mod error;
pub mod handler;
pub mod hub;
mod member;
pub mod request;
mod rooms;
pub mod server;

pub use config::ChatConfig;
pub use error::Error;
pub use handler::ChatAnnouncer;
pub use hub::{ChatStats, Hub, HubTask, Membership, MemberId};
pub use request::MemberRequest;
pub use server::ChatServer;
