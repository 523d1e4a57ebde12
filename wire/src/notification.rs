//! Messages of the datagram-oriented notification bus.

use crate::envelope::Discriminator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    // Client to server
    Register,
    Unregister,
    Ping,

    // Server to client
    RegisterSuccess,
    RegisterFailed,
    Pong,
    Notification,
    Error,
}

impl Discriminator for NotificationKind {
    fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Register => "register",
            NotificationKind::Unregister => "unregister",
            NotificationKind::Ping => "ping",
            NotificationKind::RegisterSuccess => "register_success",
            NotificationKind::RegisterFailed => "register_failed",
            NotificationKind::Pong => "pong",
            NotificationKind::Notification => "notification",
            NotificationKind::Error => "error",
        }
    }

    fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "register" => Some(NotificationKind::Register),
            "unregister" => Some(NotificationKind::Unregister),
            "ping" => Some(NotificationKind::Ping),
            "register_success" => Some(NotificationKind::RegisterSuccess),
            "register_failed" => Some(NotificationKind::RegisterFailed),
            "pong" => Some(NotificationKind::Pong),
            "notification" => Some(NotificationKind::Notification),
            "error" => Some(NotificationKind::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Required; an empty or missing id is rejected with `register_failed`.
    #[serde(default)]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnregisterRequest {
    pub client_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterSuccess {
    pub client_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterFailed {
    pub reason: String,
}

/// A chapter-release event, delivered best-effort to every live registrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub manga_id: String,
    pub manga_title: String,
    pub chapter_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_title: Option<String>,
    pub release_date: DateTime<Utc>,
    pub message: String,
}
