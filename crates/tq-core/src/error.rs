//! # Errors
//!
//! One error type shared by the value model and the paging engine.
//! It is `Clone` so a failed page loader can report the same failure
//! on every later call.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed construction, caught before anything is sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A wire value that matches none of the selector shapes.
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// A wire value that does not match the expected segment/row/model shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The backend answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
