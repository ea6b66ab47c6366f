//! # Segment — one page of results
//!
//! ```text
//! {"data": [..], "next_page": {"next_query": <opaque>}}
//! ```
//!
//! `next_page` is present iff more data exists. The continuation is kept
//! as raw JSON and posted back unchanged; only the backend interprets it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend-issued follow-up query, posted back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextPage {
    pub next_query: Value,
}

/// One immutable page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment<T> {
    /// Items of this page, in server order.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Continuation for the following page; `None` on the last one.
    #[serde(rename = "next_page", default, skip_serializing_if = "Option::is_none")]
    pub next: Option<NextPage>,
}

impl<T> Segment<T> {
    pub fn new(data: Vec<T>, next: Option<NextPage>) -> Self {
        Self { data, next }
    }

    /// A final page.
    pub fn last(data: Vec<T>) -> Self {
        Self::new(data, None)
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> Default for Segment<T> {
    fn default() -> Self {
        Self::last(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tq_core::Device;

    #[test]
    fn test_decode_with_continuation() {
        let seg: Segment<Device> = serde_json::from_value(json!({
            "data": [{"key": "d1"}, {"key": "d2"}],
            "next_page": {"next_query": {"search": {"select": "devices"}, "find": {"cursor": "abc"}}}
        }))
        .unwrap();
        assert_eq!(seg.len(), 2);
        assert!(!seg.is_last());
        let next = seg.next.unwrap();
        assert_eq!(next.next_query["find"]["cursor"], "abc");
    }

    #[test]
    fn test_decode_last_page() {
        let seg: Segment<Device> = serde_json::from_value(json!({"data": []})).unwrap();
        assert!(seg.is_last());
        assert!(seg.is_empty());

        let null_next: Segment<Device> =
            serde_json::from_value(json!({"data": [], "next_page": null})).unwrap();
        assert!(null_next.is_last());
    }

    #[test]
    fn test_encode_omits_missing_next_page() {
        let seg = Segment::last(vec![1, 2, 3]);
        assert_eq!(serde_json::to_value(&seg).unwrap(), json!({"data": [1, 2, 3]}));
    }

    #[test]
    fn test_rejects_wrong_item_shape() {
        let bad = serde_json::from_value::<Segment<Device>>(json!({"data": [42]}));
        assert!(bad.is_err());
    }
}
