//! Error types for the `notification` crate.

use std::error::Error as StdError;
use std::fmt;
use tokio::sync::mpsc::error::TrySendError;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Io,
    Codec,
    QueueFull,
    Closed,
}

impl Error {
    pub fn new(error_kind: ErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.error_kind, &self.source) {
            (ErrorKind::Io, Some(source)) => write!(f, "I/O error: {source}"),
            (ErrorKind::Io, None) => write!(f, "I/O error"),
            (ErrorKind::Codec, Some(source)) => write!(f, "codec error: {source}"),
            (ErrorKind::Codec, None) => write!(f, "codec error"),
            (ErrorKind::QueueFull, _) => write!(f, "notification queue full"),
            (ErrorKind::Closed, _) => write!(f, "notification service stopped"),
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

impl From<wire::Error> for Error {
    fn from(err: wire::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Codec,
        }
    }
}

impl<T> From<TrySendError<T>> for Error {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => Error::new(ErrorKind::QueueFull),
            TrySendError::Closed(_) => Error::new(ErrorKind::Closed),
        }
    }
}
