//! Error types for the `chat` crate.

use std::error::Error as StdError;
use std::fmt;
use tokio::sync::mpsc::error::{SendError, TrySendError};

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Io,
    QueueFull,
    /// The hub task has stopped.
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
        match &self.error_kind {
            ErrorKind::Io => match &self.source {
                Some(source) => write!(f, "I/O error: {source}"),
                None => write!(f, "I/O error"),
            },
            ErrorKind::QueueFull => write!(f, "chat hub queue full"),
            ErrorKind::Closed => write!(f, "chat hub stopped"),
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

impl<T> From<TrySendError<T>> for Error {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => Error::new(ErrorKind::QueueFull),
            TrySendError::Closed(_) => Error::new(ErrorKind::Closed),
        }
    }
}

impl<T> From<SendError<T>> for Error {
    fn from(_: SendError<T>) -> Self {
        Error::new(ErrorKind::Closed)
    }
}
