//! # Cursor — Lazy Result Sequence
//!
//! A forward-only view over every page a query produces. The cursor owns
//! the `first` segment and a [`PageSource`]; each iteration drives its own
//! [`PageLoader`], so pages are fetched only when the consumer has used up
//! the previous one.
//!
//! # Invariants
//!
//! - Items come out in page order, then in-page order.
//! - A page failure is yielded once as `Err`, after every item that came
//!   before it. The pass then returns `None`; [`CursorIter::error`] still
//!   holds the error, so a failed pass is never mistaken for exhaustion.
//! - A fresh [`Cursor::iter`] replays from `first`; pages after the first
//!   are fetched again, not cached.
//!
//! At most one iteration per cursor should be in flight when the executor
//! itself is not safe to share.

use std::fmt;
use std::vec;

use serde::de::DeserializeOwned;

use crate::page_loader::{PageLoader, PageSource};
use crate::segment::Segment;
use tq_core::{Error, Result};

/// Lazy sequence over every page of one query.
pub struct Cursor<'a, T> {
    /// The page returned by the initial request; every pass starts here.
    first: Segment<T>,
    /// Where later pages are fetched from.
    source: PageSource<'a>,
}

impl<'a, T> Cursor<'a, T> {
    pub fn new(first: Segment<T>, source: PageSource<'a>) -> Self {
        Self { first, source }
    }

    /// The page the query itself returned.
    pub fn first(&self) -> &Segment<T> {
        &self.first
    }
}

impl<'a, T: DeserializeOwned + Clone> Cursor<'a, T> {
    /// Start a new pass from the first segment.
    pub fn iter(&self) -> CursorIter<'a, T> {
        CursorIter::new(PageLoader::new(self.first.clone(), self.source.clone()))
    }

    /// Walk every page and gather the items, stopping at the first error.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.iter().collect()
    }
}

impl<'a, T: DeserializeOwned> IntoIterator for Cursor<'a, T> {
    type Item = Result<T>;
    type IntoIter = CursorIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        CursorIter::new(PageLoader::new(self.first, self.source))
    }
}

impl<'a, T: DeserializeOwned + Clone> IntoIterator for &Cursor<'a, T> {
    type Item = Result<T>;
    type IntoIter = CursorIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Element-wise equality of everything both cursors would yield,
/// terminal errors included. Fetches every page of both.
impl<T: DeserializeOwned + Clone + PartialEq> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T: fmt::Debug> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("first", &self.first)
            .field("source", &self.source)
            .finish()
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// One pass over a [`Cursor`].
///
/// Yields `Ok` items until the pages run out, or one `Err` if a page
/// fetch fails. Either way it then returns `None` for good; use
/// [`CursorIter::error`] or [`CursorIter::is_exhausted`] to tell which
/// way the pass ended.
pub struct CursorIter<'a, T> {
    loader: PageLoader<'a, T>,
    /// Items of the current page not yet yielded.
    buffer: vec::IntoIter<T>,
    /// Set once the loader reached a terminal state.
    done: bool,
}

impl<'a, T: DeserializeOwned> CursorIter<'a, T> {
    fn new(mut loader: PageLoader<'a, T>) -> Self {
        let buffer = loader.take_data().into_iter();
        Self {
            loader,
            buffer,
            done: false,
        }
    }

    /// The error that ended this pass, if it ended with one.
    pub fn error(&self) -> Option<&Error> {
        self.loader.error()
    }

    /// `true` once every page was read without error.
    pub fn is_exhausted(&self) -> bool {
        self.loader.is_exhausted()
    }
}

impl<T: DeserializeOwned> Iterator for CursorIter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            match self.loader.advance() {
                Ok(true) => self.buffer = self.loader.take_data().into_iter(),
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{media, Method};
    use crate::segment::NextPage;
    use crate::testing::ScriptedExecutor;
    use serde_json::json;

    fn next(token: &str) -> Option<NextPage> {
        Some(NextPage {
            next_query: json!({"token": token}),
        })
    }

    fn cursor<'a>(exec: &'a ScriptedExecutor, first: Segment<u32>) -> Cursor<'a, u32> {
        Cursor::new(
            first,
            PageSource::new(
                exec,
                "v2/devices/query/",
                media::DEVICE_QUERY,
                media::DEVICE_COLLECTION,
            ),
        )
    }

    #[test]
    fn test_single_page_yields_data_then_stops() {
        let exec = ScriptedExecutor::new();
        let c = cursor(&exec, Segment::last(vec![1, 2, 3]));

        assert_eq!(c.to_vec().unwrap(), vec![1, 2, 3]);
        assert!(exec.requests().is_empty());
    }

    #[test]
    fn test_pages_chain_in_order() {
        let exec = ScriptedExecutor::new()
            .reply(200, json!({"data": [3, 4], "next_page": {"next_query": {"token": "p3"}}}))
            .reply(200, json!({"data": [5]}));
        let c = cursor(&exec, Segment::new(vec![1, 2], next("p2")));

        assert_eq!(c.to_vec().unwrap(), vec![1, 2, 3, 4, 5]);

        let sent = exec.requests();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|r| r.method == Method::Post));
        assert_eq!(sent[0].body, Some(json!({"token": "p2"})));
        assert_eq!(sent[1].body, Some(json!({"token": "p3"})));
    }

    #[test]
    fn test_pages_are_fetched_lazily() {
        let exec = ScriptedExecutor::new().reply(200, json!({"data": [3]}));
        let c = cursor(&exec, Segment::new(vec![1, 2], next("p2")));

        let mut it = c.iter();
        assert_eq!(it.next(), Some(Ok(1)));
        assert_eq!(it.next(), Some(Ok(2)));
        assert!(exec.requests().is_empty());
        assert_eq!(it.next(), Some(Ok(3)));
        assert_eq!(exec.requests().len(), 1);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_empty_middle_page_is_skipped() {
        let exec = ScriptedExecutor::new()
            .reply(200, json!({"data": [], "next_page": {"next_query": {"token": "p3"}}}))
            .reply(200, json!({"data": [9]}));
        let c = cursor(&exec, Segment::new(vec![], next("p2")));
        assert_eq!(c.to_vec().unwrap(), vec![9]);
    }

    #[test]
    fn test_failure_after_first_page_is_reported() {
        let exec = ScriptedExecutor::new().reply_raw(403, "Forbidden");
        let c = cursor(&exec, Segment::new(vec![1, 2], next("p2")));

        let mut it = c.iter();
        let items: Vec<_> = it.by_ref().collect();
        let expected = Error::RequestFailed {
            status: 403,
            message: "Forbidden".into(),
        };
        assert_eq!(items, vec![Ok(1), Ok(2), Err(expected.clone())]);
        assert_eq!(it.error(), Some(&expected));
        assert_eq!(it.next(), None);

        assert_eq!(c.to_vec(), Err(Error::Transport("no scripted reply".into())));
    }

    #[test]
    fn test_iter_replays_from_first() {
        let exec = ScriptedExecutor::new()
            .reply(200, json!({"data": [3]}))
            .reply(200, json!({"data": [3]}));
        let c = cursor(&exec, Segment::new(vec![1, 2], next("p2")));

        let mut first_pass = c.iter();
        assert_eq!(first_pass.next(), Some(Ok(1)));
        drop(first_pass);

        assert_eq!(c.to_vec().unwrap(), vec![1, 2, 3]);
        assert_eq!(c.to_vec().unwrap(), vec![1, 2, 3]);
        assert_eq!(exec.requests().len(), 2);
    }

    #[test]
    fn test_cursor_equality_materializes_both() {
        let a_exec = ScriptedExecutor::new().reply(200, json!({"data": [2, 3]}));
        let b_exec = ScriptedExecutor::new();
        let a = cursor(&a_exec, Segment::new(vec![1], next("p2")));
        let b = cursor(&b_exec, Segment::last(vec![1, 2, 3]));
        assert_eq!(a, b);

        let c_exec = ScriptedExecutor::new();
        let c = cursor(&c_exec, Segment::last(vec![1, 2]));
        assert_ne!(b, c);
    }

    #[test]
    fn test_consuming_iteration() {
        let exec = ScriptedExecutor::new();
        let c = cursor(&exec, Segment::last(vec![7, 8]));
        let mut total = 0;
        for item in c {
            total += item.unwrap();
        }
        assert_eq!(total, 15);
    }

    #[test]
    fn test_end_of_pass_tells_failure_from_exhaustion() {
        let exec = ScriptedExecutor::new().reply_raw(500, "boom");
        let failed = cursor(&exec, Segment::new(vec![1], next("p2")));
        let mut it = failed.iter();
        assert_eq!(it.next(), Some(Ok(1)));
        assert!(matches!(it.next(), Some(Err(Error::RequestFailed { status: 500, .. }))));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
        assert!(!it.is_exhausted());
        assert!(matches!(it.error(), Some(Error::RequestFailed { status: 500, .. })));

        let clean_exec = ScriptedExecutor::new();
        let clean = cursor(&clean_exec, Segment::last(vec![1]));
        let mut it = clean.iter();
        assert_eq!(it.next(), Some(Ok(1)));
        assert_eq!(it.next(), None);
        assert!(it.is_exhausted());
        assert_eq!(it.error(), None);
    }
}
