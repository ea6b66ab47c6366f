//! # Response envelope
//!
//! Every call yields a [`Response`]: the decoded value (if any), the HTTP
//! status, a message, and a [`MultiStatus`] with per-item outcomes.
//!
//! | Status        | [`State`]        | `multi_status`                 |
//! |---------------|------------------|--------------------------------|
//! | 2xx except 207| `Success`        | one success entry              |
//! | 207           | `PartialSuccess` | decoded from the body          |
//! | anything else | `Failure`        | one entry carrying the message |

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::executor::RawResponse;
use tq_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Success,
    PartialSuccess,
    Failure,
}

impl State {
    pub fn from_status(status: u16) -> Self {
        match status {
            207 => State::PartialSuccess,
            200..=299 => State::Success,
            _ => State::Failure,
        }
    }
}

/// Outcome of one unit inside a multi-part request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub status: u16,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl Status {
    pub fn is_success(&self) -> bool {
        State::from_status(self.status) == State::Success
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiStatus {
    #[serde(rename = "multistatus", default)]
    pub statuses: Vec<Status>,
}

impl MultiStatus {
    fn single(status: u16, messages: Vec<String>) -> Self {
        Self {
            statuses: vec![Status { status, messages }],
        }
    }

    pub fn is_success(&self) -> bool {
        self.statuses.iter().all(Status::is_success)
    }

    /// Some units succeeded, some did not.
    pub fn is_partial_success(&self) -> bool {
        self.statuses.iter().any(Status::is_success) && !self.is_success()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Status> {
        self.statuses.iter().filter(|s| !s.is_success())
    }
}

/// A value for calls that return nothing worth decoding.
///
/// Accepts any body, including an empty one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unit;

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer).map(|_| Unit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    pub value: Option<T>,
    pub status: u16,
    pub message: String,
    pub multi_status: MultiStatus,
}

impl<T: DeserializeOwned> Response<T> {
    /// Interpret a raw reply. Only a success body is decoded as `T`; a
    /// body that does not fit is a [`Error::Decode`], never a silent `None`.
    pub fn from_raw(raw: RawResponse) -> Result<Self> {
        let status = raw.status;
        let body = raw.body.trim();
        match State::from_status(status) {
            State::Success => {
                let value = if body.is_empty() {
                    serde_json::from_value(Value::Null).ok()
                } else {
                    Some(serde_json::from_str(body)?)
                };
                Ok(Self {
                    value,
                    status,
                    message: raw.reason,
                    multi_status: MultiStatus::single(status, Vec::new()),
                })
            }
            State::PartialSuccess => {
                let multi_status = serde_json::from_str(body)?;
                Ok(Self {
                    value: None,
                    status,
                    message: raw.reason,
                    multi_status,
                })
            }
            State::Failure => {
                let message = if body.is_empty() {
                    raw.reason
                } else {
                    body.to_string()
                };
                Ok(Self {
                    value: None,
                    status,
                    multi_status: MultiStatus::single(status, vec![message.clone()]),
                    message,
                })
            }
        }
    }
}

impl<T> Response<T> {
    pub fn state(&self) -> State {
        State::from_status(self.status)
    }

    pub fn is_success(&self) -> bool {
        self.state() == State::Success
    }

    /// The value of a fully successful call; anything else is
    /// [`Error::RequestFailed`].
    pub fn into_value(self) -> Result<T> {
        match self.state() {
            State::Success => self
                .value
                .ok_or_else(|| Error::Decode("response body was empty".into())),
            State::PartialSuccess | State::Failure => Err(self.into_error()),
        }
    }

    fn into_error(self) -> Error {
        let details: Vec<String> = self
            .multi_status
            .failures()
            .flat_map(|s| s.messages.iter().cloned())
            .collect();
        let message = if details.is_empty() {
            self.message
        } else {
            details.join("; ")
        };
        Error::RequestFailed {
            status: self.status,
            message,
        }
    }
}
