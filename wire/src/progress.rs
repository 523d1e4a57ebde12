//! Messages of the stream-oriented progress sync bus.

use crate::envelope::Discriminator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    // Client to server
    Auth,
    Ping,
    Progress,

    // Server to client
    AuthSuccess,
    AuthFailed,
    Pong,
    Broadcast,
    Error,
}

impl Discriminator for ProgressKind {
    fn as_str(&self) -> &'static str {
        match self {
            ProgressKind::Auth => "auth",
            ProgressKind::Ping => "ping",
            ProgressKind::Progress => "progress",
            ProgressKind::AuthSuccess => "auth_success",
            ProgressKind::AuthFailed => "auth_failed",
            ProgressKind::Pong => "pong",
            ProgressKind::Broadcast => "broadcast",
            ProgressKind::Error => "error",
        }
    }

    fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "auth" => Some(ProgressKind::Auth),
            "ping" => Some(ProgressKind::Ping),
            "progress" => Some(ProgressKind::Progress),
            "auth_success" => Some(ProgressKind::AuthSuccess),
            "auth_failed" => Some(ProgressKind::AuthFailed),
            "pong" => Some(ProgressKind::Pong),
            "broadcast" => Some(ProgressKind::Broadcast),
            "error" => Some(ProgressKind::Error),
            _ => None,
        }
    }
}

/// A user's reading status for a manga.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    #[default]
    Reading,
    Completed,
    PlanToRead,
    OnHold,
    Dropped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub token: String,
}

/// Progress update submitted by an authenticated stream client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub manga_id: String,
    pub current_chapter: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReadingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSuccess {
    pub user_id: String,
    pub username: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFailed {
    pub reason: String,
}

/// A reading-progress change, fanned out to every authenticated session.
///
/// Produced either by the request-handling surface after a successful
/// persistence write (through the event bridge) or by a stream client's own
/// `progress` message. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub user_id: String,
    pub username: String,
    pub manga_id: String,
    pub manga_title: String,
    pub current_chapter: u32,
    pub status: ReadingStatus,
    /// Server-stamped time of the change.
    pub timestamp: DateTime<Utc>,
}
