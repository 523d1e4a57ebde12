//! Progress sync service: an authenticated, ordered broadcast bus over TCP.
//!
//! Every connected client that has authenticated sees every reading-progress
//! event published since it joined, in publication order.
//!
//! # Architecture
//!
//! - **Line-framed envelopes**: one JSON envelope per line (see the `wire` crate).
//! - **Authentication gate**: the first frame must be `auth` carrying a bearer
//!   credential, checked by an injected [`CredentialValidator`] within a
//!   bounded window (30 s by default).
//! - **Dual-index registry**: sessions are indexed by connection id and by
//!   user id under a single lock, so a user's devices can be addressed together.
//! - **Single fan-out task**: all events pass through one bounded ingress
//!   queue and are dispatched serially, which is what gives the ordering guarantee.
//! - **Bounded outbound queues**: each session owns a bounded queue drained
//!   by one writer task; a full queue or a write exceeding the write deadline
//!   evicts the session. The fan-out task never waits on a slow client.
//!
//! # Session lifecycle
//!
//! `Accepted -> Authenticating -> Authenticated -> Closed`. Any I/O error, an
//! auth failure, an auth timeout, eviction or service shutdown ends in `Closed`.
//! Once authenticated only `ping` and `progress` are accepted; anything else is
//! answered with an `error` envelope and the session stays open.
//!
//! # Modules
//!
//! - `auth`: `CredentialValidator` trait and the JWT implementation
//! - `registry`: session registry with its per-user index
//! - `outbound`: bounded outbound queue and writer task
//! - `session`: per-connection handshake and read loop
//! - `manager`: public ingress (`ProgressSync`) and the fan-out task
//! - `server`: TCP accept loop

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod manager;
pub mod outbound;
pub mod registry;
pub mod server;
mod session;

pub use auth::{CredentialValidator, Identity, JwtValidator};
pub use config::SyncConfig;
pub use error::Error;
pub use handler::ProgressSyncEventHandler;
pub use manager::{FanOut, ProgressSync, SyncStats};
pub use server::ProgressSyncServer;
