//! Messages of the room-partitioned chat hub.

use crate::envelope::{encode_at, Discriminator};
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Chat,
    System,
    Error,
    JoinRoom,
    LeaveRoom,
}

impl Discriminator for ChatKind {
    fn as_str(&self) -> &'static str {
        match self {
            ChatKind::Chat => "chat",
            ChatKind::System => "system",
            ChatKind::Error => "error",
            ChatKind::JoinRoom => "join_room",
            ChatKind::LeaveRoom => "leave_room",
        }
    }

    fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "chat" => Some(ChatKind::Chat),
            "system" => Some(ChatKind::System),
            "error" => Some(ChatKind::Error),
            "join_room" => Some(ChatKind::JoinRoom),
            "leave_room" => Some(ChatKind::LeaveRoom),
            _ => None,
        }
    }
}

/// The `data` of a chat envelope, in both directions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// A chat, system or error event routed by the hub.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEvent {
    pub kind: ChatKind,
    pub username: Option<String>,
    /// Target room. Error events addressed to a single member carry none.
    pub room: Option<String>,
    pub content: String,
    /// Server-stamped time.
    pub timestamp: DateTime<Utc>,
}

impl ChatEvent {
    pub fn chat(username: &str, room: &str, content: impl Into<String>) -> Self {
        Self {
            kind: ChatKind::Chat,
            username: Some(username.to_string()),
            room: Some(room.to_string()),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(room: &str, content: impl Into<String>) -> Self {
        Self {
            kind: ChatKind::System,
            username: None,
            room: Some(room.to_string()),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            kind: ChatKind::Error,
            username: None,
            room: None,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Encodes the event as one WebSocket text frame stamped with the time it was created.
    pub fn encode(&self) -> Result<String, Error> {
        let payload = ChatPayload {
            username: self.username.clone(),
            room: self.room.clone(),
            content: self.content.clone(),
        };
        encode_at(self.kind, &payload, self.timestamp)
    }
}
