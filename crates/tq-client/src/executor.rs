//! # Executor — the one capability the engine needs
//!
//! Everything that touches the network goes through [`Executor::execute`].
//! Authentication, TLS and timeouts belong to the implementation
//! ([`HttpExecutor`](crate::HttpExecutor) in production, a scripted fake in
//! tests). One call is one attempt; nothing here retries.

use std::fmt;

use serde_json::Value;

use tq_core::Result;

/// Media types understood by the backend.
pub mod media {
    pub const JSON: &str = "application/json";
    pub const ERROR: &str = "application/prs.tempoiq.error.v1+json";
    pub const DEVICE: &str = "application/prs.tempoiq.device.v2+json";
    pub const DEVICE_QUERY: &str = "application/prs.tempoiq.device-query.v1+json";
    pub const DEVICE_COLLECTION: &str = "application/prs.tempoiq.device-collection.v2+json";
    pub const DATAPOINT_QUERY: &str = "application/prs.tempoiq.datapoint-query.v1+json";
    pub const DATAPOINT_COLLECTION: &str = "application/prs.tempoiq.datapoint-collection.v2+json";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound call. `path` is relative to the executor's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub content_type: String,
    /// Sent as one `Accept` header, in order of preference.
    pub accept: Vec<String>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            content_type: media::JSON.to_string(),
            accept: vec![media::JSON.to_string()],
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    /// `primary` first, then plain JSON and the error type as fallbacks.
    pub fn accept(mut self, primary: &str) -> Self {
        self.accept = [primary, media::JSON, media::ERROR]
            .iter()
            .map(|m| m.to_string())
            .collect();
        self.accept.dedup();
        self
    }
}

/// What came back, before any interpretation of status or body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

pub trait Executor {
    /// Perform `request` once. `Err` means no response arrived at all;
    /// a non-success status is still `Ok`.
    fn execute(&self, request: &Request) -> Result<RawResponse>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, request: &Request) -> Result<RawResponse> {
        (**self).execute(request)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&self, request: &Request) -> Result<RawResponse> {
        (**self).execute(request)
    }
}
