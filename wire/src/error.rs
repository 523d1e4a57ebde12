//! Error types for the `wire` crate.

use std::error::Error as StdError;
use std::fmt;

/// Codec error. Holds the kind of failure and, when available, the
/// underlying serde error.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The frame is not a well-formed envelope.
    InvalidEnvelope,
    /// The envelope is well-formed but its discriminator is outside the service's closed set.
    UnknownMessageType(String),
    /// The deferred payload does not have the shape its discriminator requires.
    InvalidPayload,
    /// An outgoing envelope could not be serialized.
    Encode,
}

impl Error {
    pub(crate) fn new(error_kind: ErrorKind, source: serde_json::Error) -> Self {
        Self {
            source: Some(Box::new(source)),
            error_kind,
        }
    }

    pub(crate) fn unknown_message_type(kind: &str) -> Self {
        Self {
            source: None,
            error_kind: ErrorKind::UnknownMessageType(kind.to_string()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::InvalidEnvelope => write!(f, "invalid message envelope"),
            ErrorKind::UnknownMessageType(kind) => write!(f, "unknown message type: {kind}"),
            ErrorKind::InvalidPayload => write!(f, "invalid message payload"),
            ErrorKind::Encode => write!(f, "failed to encode message"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}
