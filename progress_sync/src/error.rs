//! Error types for the `progress_sync` crate.

use std::error::Error as StdError;
use std::fmt;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::codec::LinesCodecError;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Io,
    Codec,
    AuthFailed(String),
    AuthTimeout,
    /// A bounded queue was full; the frame or event was dropped.
    QueueFull,
    /// The peer, the session or the service is gone.
    Closed,
}

impl Error {
    pub fn new(error_kind: ErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }

    pub(crate) fn closed() -> Self {
        Self::new(ErrorKind::Closed)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Io => match &self.source {
                Some(source) => write!(f, "I/O error: {source}"),
                None => write!(f, "I/O error"),
            },
            ErrorKind::Codec => match &self.source {
                Some(source) => write!(f, "codec error: {source}"),
                None => write!(f, "codec error"),
            },
            ErrorKind::AuthFailed(reason) => write!(f, "authentication failed: {reason}"),
            ErrorKind::AuthTimeout => write!(f, "authentication timeout"),
            ErrorKind::QueueFull => write!(f, "queue full"),
            ErrorKind::Closed => write!(f, "closed"),
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

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Io,
        }
    }
}

impl From<LinesCodecError> for Error {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::Io(io) => io.into(),
            LinesCodecError::MaxLineLengthExceeded => Error {
                source: Some(Box::new(err)),
                error_kind: ErrorKind::Codec,
            },
        }
    }
}

impl From<wire::Error> for Error {
    fn from(err: wire::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Codec,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error {
            error_kind: ErrorKind::AuthFailed(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl<T> From<TrySendError<T>> for Error {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => Error::new(ErrorKind::QueueFull),
            TrySendError::Closed(_) => Error::closed(),
        }
    }
}
