use crate::error::{Error, ErrorKind};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

// A missing `data` field decodes as an empty object so payloads made only of
// optional fields (ping, leave_room) still decode.
const EMPTY_PAYLOAD: &str = "{}";

/// A closed set of message kinds understood by one service.
pub trait Discriminator: Copy + Sized {
    /// The `type` string used on the wire.
    fn as_str(&self) -> &'static str;

    /// Maps a wire `type` string back to a kind, `None` when it is not part of the set.
    fn from_wire(kind: &str) -> Option<Self>;
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    data: Option<Box<RawValue>>,
}

/// An incoming envelope with a resolved discriminator and a deferred payload.
#[derive(Debug)]
pub struct Incoming<K> {
    pub kind: K,
    /// Sender-stamped time, if the sender provided one.
    pub timestamp: Option<DateTime<Utc>>,
    data: Option<Box<RawValue>>,
}

impl<K: Discriminator> Incoming<K> {
    /// Parses one frame (a line, a datagram or a WebSocket text message).
    pub fn parse(frame: impl AsRef<[u8]>) -> Result<Self, Error> {
        let raw: RawEnvelope = serde_json::from_slice(frame.as_ref())
            .map_err(|e| Error::new(ErrorKind::InvalidEnvelope, e))?;

        let kind = K::from_wire(&raw.kind).ok_or_else(|| Error::unknown_message_type(&raw.kind))?;

        Ok(Self {
            kind,
            timestamp: raw.timestamp,
            data: raw.data,
        })
    }

    /// Decodes the deferred payload into the type the discriminator calls for.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let json = self.data.as_deref().map_or(EMPTY_PAYLOAD, RawValue::get);
        serde_json::from_str(json).map_err(|e| Error::new(ErrorKind::InvalidPayload, e))
    }
}

#[derive(Serialize)]
struct Outgoing<'a, T: Serialize> {
    #[serde(rename = "type")]
    kind: &'static str,
    timestamp: DateTime<Utc>,
    data: &'a T,
}

/// Encodes a payload into an envelope stamped with the current time.
///
/// The returned string carries no framing; each transport adds its own
/// (a trailing line-feed on the stream bus, nothing on datagrams and WebSocket frames).
pub fn encode<K: Discriminator, T: Serialize>(kind: K, data: &T) -> Result<String, Error> {
    encode_at(kind, data, Utc::now())
}

/// Encodes a payload into an envelope carrying an already-known `timestamp`.
pub fn encode_at<K: Discriminator, T: Serialize>(
    kind: K,
    data: &T,
    timestamp: DateTime<Utc>,
) -> Result<String, Error> {
    let envelope = Outgoing {
        kind: kind.as_str(),
        timestamp,
        data,
    };
    serde_json::to_string(&envelope).map_err(|e| Error::new(ErrorKind::Encode, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{AuthRequest, ProgressKind};
    use serde_json::Value;

    #[test]
    fn parse_resolves_discriminator_and_defers_payload() {
        let incoming: Incoming<ProgressKind> = Incoming::parse(
            r#"{"type":"auth","timestamp":"2024-05-01T10:00:00Z","data":{"token":"abc"}}"#,
        )
        .unwrap();

        assert_eq!(incoming.kind, ProgressKind::Auth);
        assert!(incoming.timestamp.is_some());

        let auth: AuthRequest = incoming.payload().unwrap();
        assert_eq!(auth.token, "abc");
    }

    #[test]
    fn parse_rejects_frames_that_are_not_envelopes() {
        let err = Incoming::<ProgressKind>::parse("not json").unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::InvalidEnvelope);

        let err = Incoming::<ProgressKind>::parse(r#"{"data":{}}"#).unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::InvalidEnvelope);
    }

    #[test]
    fn parse_rejects_truncated_frames() {
        let err = Incoming::<ProgressKind>::parse(r#"{"type":"auth","data":{"tok"#).unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::InvalidEnvelope);
    }

    #[test]
    fn parse_reports_unknown_discriminator() {
        let err = Incoming::<ProgressKind>::parse(r#"{"type":"teleport","data":{}}"#).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::UnknownMessageType("teleport".to_string())
        );
    }

    #[test]
    fn payload_of_wrong_shape_is_invalid_payload() {
        let incoming: Incoming<ProgressKind> =
            Incoming::parse(r#"{"type":"auth","data":{"token":42}}"#).unwrap();
        let err = incoming.payload::<AuthRequest>().unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::InvalidPayload);
    }

    #[test]
    fn missing_data_decodes_as_empty_object() {
        let incoming: Incoming<ProgressKind> = Incoming::parse(r#"{"type":"ping"}"#).unwrap();
        let ping: crate::common::Ping = incoming.payload().unwrap();
        assert!(ping.client_time.is_none());
    }

    #[test]
    fn encode_stamps_type_timestamp_and_data() {
        let json = encode(
            ProgressKind::AuthFailed,
            &crate::progress::AuthFailed {
                reason: "nope".to_string(),
            },
        )
        .unwrap();

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "auth_failed");
        assert_eq!(value["data"]["reason"], "nope");
        assert!(value["timestamp"].as_str().is_some());
    }
}
