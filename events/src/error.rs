//! Error types for the `events` crate.

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
    /// The bridge channel is at capacity; the event was dropped.
    QueueFull,
    /// The relay is gone; the event was dropped.
    Closed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.error_kind {
            ErrorKind::QueueFull => write!(f, "bridge queue full, event dropped"),
            ErrorKind::Closed => write!(f, "bridge closed, event dropped"),
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

impl<T> From<TrySendError<T>> for Error {
    fn from(err: TrySendError<T>) -> Self {
        let error_kind = match err {
            TrySendError::Full(_) => ErrorKind::QueueFull,
            TrySendError::Closed(_) => ErrorKind::Closed,
        };
        Error {
            source: None,
            error_kind,
        }
    }
}
