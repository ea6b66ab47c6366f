//! # Page Loader — fetches the next segment on demand
//!
//! ```text
//!            advance(): next absent
//! Ready(seg) ──────────────────────────► Exhausted
//!     │ ▲
//!     │ └──── advance(): POST next_query, 2xx + decodable body
//!     │
//!     └────── advance(): non-success status, decode or transport error ──► Failed(err)
//! ```
//!
//! One request per `advance()`, issued only when asked. Both terminal states
//! are sticky: `Exhausted` keeps answering `Ok(false)`, `Failed` keeps
//! answering the same error.

use std::fmt;
use std::mem;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::executor::{Executor, Method, Request};
use crate::response::Response;
use crate::segment::{NextPage, Segment};
use tq_core::{Error, Result};

/// Where continuation pages come from: the executor and the endpoint and
/// media types captured from the query that produced the first page.
#[derive(Clone)]
pub struct PageSource<'a> {
    executor: &'a dyn Executor,
    /// Endpoint of the original query; continuations go to the same place.
    path: String,
    content_type: String,
    /// Preferred media type of the returned page.
    accept: String,
}

impl<'a> PageSource<'a> {
    pub fn new(
        executor: &'a dyn Executor,
        path: impl Into<String>,
        content_type: &str,
        accept: &str,
    ) -> Self {
        Self {
            executor,
            path: path.into(),
            content_type: content_type.to_string(),
            accept: accept.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `POST` the opaque continuation back to the same endpoint.
    pub fn fetch<T: DeserializeOwned>(&self, next: &NextPage) -> Result<Segment<T>> {
        let request = Request::new(Method::Post, self.path.clone())
            .body(next.next_query.clone())
            .content_type(&self.content_type)
            .accept(&self.accept);

        debug!(path = %self.path, "fetching next page");
        let response: Response<Segment<T>> = Response::from_raw(self.executor.execute(&request)?)?;
        debug!(path = %self.path, status = response.status, "page response");

        if !response.is_success() {
            warn!(path = %self.path, status = response.status, "page fetch failed");
        }
        response.into_value()
    }
}

impl fmt::Debug for PageSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageSource")
            .field("path", &self.path)
            .field("content_type", &self.content_type)
            .field("accept", &self.accept)
            .finish_non_exhaustive()
    }
}

/// Where a [`PageLoader`] stands. The last two are terminal.
enum LoaderState<T> {
    Ready(Segment<T>),
    Exhausted,
    Failed(Error),
}

/// Pull-based state machine over a query's pages.
///
/// Starts `Ready` on the first segment and makes at most one request per
/// [`PageLoader::advance`]. Not shareable across threads while advancing.
pub struct PageLoader<'a, T> {
    source: PageSource<'a>,
    state: LoaderState<T>,
}

impl<'a, T: DeserializeOwned> PageLoader<'a, T> {
    pub fn new(first: Segment<T>, source: PageSource<'a>) -> Self {
        Self {
            source,
            state: LoaderState::Ready(first),
        }
    }

    /// Move to the next segment.
    ///
    /// `Ok(true)`: a new segment is current. `Ok(false)`: no more data.
    /// `Err`: the fetch failed; this loader is now failed for good.
    pub fn advance(&mut self) -> Result<bool> {
        let next = match &self.state {
            LoaderState::Ready(segment) => segment.next.clone(),
            LoaderState::Exhausted => return Ok(false),
            LoaderState::Failed(e) => return Err(e.clone()),
        };
        let Some(next) = next else {
            self.state = LoaderState::Exhausted;
            return Ok(false);
        };
        match self.source.fetch(&next) {
            Ok(segment) => {
                self.state = LoaderState::Ready(segment);
                Ok(true)
            }
            Err(e) => {
                self.state = LoaderState::Failed(e.clone());
                Err(e)
            }
        }
    }

    /// The current segment, `None` once exhausted or failed.
    pub fn current(&self) -> Option<&Segment<T>> {
        match &self.state {
            LoaderState::Ready(segment) => Some(segment),
            _ => None,
        }
    }

    /// Move the current segment's items out, keeping its continuation.
    pub fn take_data(&mut self) -> Vec<T> {
        match &mut self.state {
            LoaderState::Ready(segment) => mem::take(&mut segment.data),
            _ => Vec::new(),
        }
    }

    /// No more pages, reached without error.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, LoaderState::Exhausted)
    }

    /// The error that failed this loader, if any.
    pub fn error(&self) -> Option<&Error> {
        match &self.state {
            LoaderState::Failed(e) => Some(e),
            _ => None,
        }
    }
}
