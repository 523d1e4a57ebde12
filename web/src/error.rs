use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The request body is well-formed JSON but not an acceptable value.
    Invalid(String),
    /// A bus the request feeds cannot take more work right now.
    Unavailable,
}

impl Error {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self {
            source: None,
            error_kind: ErrorKind::Invalid(reason.into()),
        }
    }

    fn unavailable(source: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
            error_kind: ErrorKind::Unavailable,
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

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        match &self.error_kind {
            ErrorKind::Invalid(reason) => write!(fmt, "invalid request: {reason}"),
            ErrorKind::Unavailable => write!(fmt, "service unavailable"),
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.error_kind {
            ErrorKind::Invalid(reason) => (StatusCode::UNPROCESSABLE_ENTITY, reason).into_response(),
            ErrorKind::Unavailable => {
                warn!("Rejecting request: {:?}", self.source);
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE UNAVAILABLE").into_response()
            }
        }
    }
}

impl From<events::Error> for Error {
    fn from(err: events::Error) -> Self {
        Self::unavailable(err)
    }
}

impl From<chat::Error> for Error {
    fn from(err: chat::Error) -> Self {
        Self::unavailable(err)
    }
}
