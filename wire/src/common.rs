//! Payloads shared by more than one service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error codes carried by `error` envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The frame could not be parsed as an envelope.
    InvalidMessage,
    /// The discriminator is not accepted by this service (or in this state).
    UnknownMessageType,
    /// No credential arrived within the handshake window.
    AuthTimeout,
    /// The payload of a known discriminator could not be decoded.
    InvalidData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ping {
    #[serde(default)]
    pub client_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pong {
    pub server_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_time: Option<DateTime<Utc>>,
}

impl Pong {
    /// Answers a ping, echoing the client's clock when it sent one.
    pub fn reply_to(ping: &Ping) -> Self {
        Self {
            server_time: Utc::now(),
            client_time: ping.client_time,
        }
    }
}
