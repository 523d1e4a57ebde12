use log::*;
use wire::chat::{ChatKind, ChatPayload};
use wire::error::ErrorKind as WireErrorKind;
use wire::Incoming;

/// What a member asked the hub to do with one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberRequest {
    Chat { content: String },
    JoinRoom { room: String },
    LeaveRoom,
    /// A well-formed envelope the hub cannot act on; answered with an error.
    Rejected { reason: String },
}

impl MemberRequest {
    /// Decodes one text frame. Frames that are not envelopes are dropped
    /// silently and yield `None`.
    pub fn parse(frame: &str) -> Option<Self> {
        let incoming = match Incoming::<ChatKind>::parse(frame) {
            Ok(incoming) => incoming,
            Err(e) => {
                return match e.error_kind {
                    WireErrorKind::UnknownMessageType(kind) => Some(Self::unknown(&kind)),
                    _ => {
                        debug!("Dropping malformed chat frame: {e}");
                        None
                    }
                };
            }
        };

        let payload = match incoming.payload::<ChatPayload>() {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Dropping chat frame with invalid data: {e}");
                return None;
            }
        };

        match incoming.kind {
            ChatKind::Chat if payload.content.trim().is_empty() => None,
            ChatKind::Chat => Some(Self::Chat {
                content: payload.content,
            }),
            ChatKind::JoinRoom => match payload.room {
                Some(room) if !room.trim().is_empty() => Some(Self::JoinRoom {
                    room: room.trim().to_string(),
                }),
                _ => Some(Self::Rejected {
                    reason: "join_room requires a room".to_string(),
                }),
            },
            ChatKind::LeaveRoom => Some(Self::LeaveRoom),
            ChatKind::System => Some(Self::unknown("system")),
            ChatKind::Error => Some(Self::unknown("error")),
        }
    }

    fn unknown(kind: &str) -> Self {
        Self::Rejected {
            reason: format!("Unknown message type: {kind}"),
        }
    }
}
