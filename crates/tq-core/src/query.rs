//! # Query — a search plus an action
//!
//! ```text
//! FindQuery   {"search": .., "find": ..}
//! ReadQuery   {"search": .., "read": .., "pipeline"?: ..}
//! SingleQuery {"search": .., "single": .., "pipeline"?: ..}
//! ```
//!
//! An absent pipeline is left out of the payload entirely, never `null`.
//! Nothing here validates time ranges or empty selections; the backend
//! rejects those and the caller sees a failed request.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::selection::Selection;
use crate::selector::ObjectType;
use crate::time::{zoned, Timestamp};

/// Which object type a query returns, and the selection that scopes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Search {
    pub select: ObjectType,
    pub filters: Selection,
}

impl Search {
    pub fn new(select: ObjectType, filters: Selection) -> Self {
        Self { select, filters }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantifier {
    #[default]
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Find {
    pub quantifier: Quantifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl Find {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Read {
    #[serde(with = "zoned")]
    pub start: Timestamp,
    #[serde(with = "zoned")]
    pub stop: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl Read {
    pub fn new(start: Timestamp, stop: Timestamp) -> Self {
        Self {
            start,
            stop,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// How a single-value read picks its point relative to a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionFunction {
    Latest,
    Earliest,
    Nearest,
    Before,
    After,
    Exact,
}

impl DirectionFunction {
    /// `Latest` and `Earliest` are absolute; the rest are relative to a timestamp.
    pub fn needs_timestamp(&self) -> bool {
        !matches!(self, DirectionFunction::Latest | DirectionFunction::Earliest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Single {
    pub function: DirectionFunction,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "zoned::option")]
    pub timestamp: Option<Timestamp>,
}

impl Single {
    pub fn new(function: DirectionFunction, timestamp: Option<Timestamp>) -> Result<Self> {
        match (function.needs_timestamp(), timestamp.is_some()) {
            (true, false) => Err(Error::InvalidArgument(format!(
                "single value function '{:?}' needs a timestamp",
                function
            ))),
            (false, true) => Err(Error::InvalidArgument(format!(
                "single value function '{:?}' takes no timestamp",
                function
            ))),
            _ => Ok(Self {
                function,
                timestamp,
            }),
        }
    }

    pub fn latest() -> Self {
        Self {
            function: DirectionFunction::Latest,
            timestamp: None,
        }
    }

    pub fn earliest() -> Self {
        Self {
            function: DirectionFunction::Earliest,
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindQuery {
    pub search: Search,
    pub find: Find,
}

impl FindQuery {
    pub fn new(search: Search, find: Find) -> Self {
        Self { search, find }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadQuery {
    pub search: Search,
    pub read: Read,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<Pipeline>,
}

impl ReadQuery {
    pub fn new(search: Search, read: Read) -> Self {
        Self {
            search,
            read,
            pipeline: None,
        }
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleQuery {
    pub search: Search,
    pub single: Single,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<Pipeline>,
}

impl SingleQuery {
    pub fn new(search: Search, single: Single) -> Self {
        Self {
            search,
            single,
            pipeline: None,
        }
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }
}

/// Any request shape. Decoding picks the variant by its action field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Query {
    Find(FindQuery),
    Read(ReadQuery),
    Single(SingleQuery),
}

impl Query {
    pub fn search(&self) -> &Search {
        match self {
            Query::Find(q) => &q.search,
            Query::Read(q) => &q.search,
            Query::Single(q) => &q.search,
        }
    }
}

impl From<FindQuery> for Query {
    fn from(q: FindQuery) -> Self {
        Query::Find(q)
    }
}

impl From<ReadQuery> for Query {
    fn from(q: ReadQuery) -> Self {
        Query::Read(q)
    }
}

impl From<SingleQuery> for Query {
    fn from(q: SingleQuery) -> Self {
        Query::Single(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::Fold;
    use crate::selector::Selector;
    use crate::time::parse_zoned;
    use serde_json::json;

    fn t(raw: &str) -> Timestamp {
        parse_zoned(raw).unwrap()
    }

    fn sensors_of_building_4() -> Search {
        Search::new(
            ObjectType::Sensors,
            Selection::devices(Selector::attribute("building", "4")),
        )
    }

    #[test]
    fn test_find_query_wire_form() {
        let q = FindQuery::new(
            Search::new(ObjectType::Devices, Selection::devices(Selector::all())),
            Find::all().with_limit(10),
        );
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({
                "search": {"select": "devices", "filters": {"devices": "all"}},
                "find": {"quantifier": "all", "limit": 10}
            })
        );
    }

    #[test]
    fn test_read_query_omits_absent_pipeline() {
        let q = ReadQuery::new(
            sensors_of_building_4(),
            Read::new(
                t("2012-01-01T00:00:00.000+00:00"),
                t("2012-01-02T00:00:00.000+00:00"),
            ),
        );
        let json = serde_json::to_value(&q).unwrap();
        assert!(json.get("pipeline").is_none());
        assert_eq!(
            json["read"],
            json!({"start": "2012-01-01T00:00:00.000+00:00", "stop": "2012-01-02T00:00:00.000+00:00"})
        );
    }

    #[test]
    fn test_read_query_with_pipeline() {
        let start = t("2012-01-01T00:00:00.000+00:00");
        let q = ReadQuery::new(
            sensors_of_building_4(),
            Read::new(start, t("2012-01-02T00:00:00.000+00:00")),
        )
        .with_pipeline(Pipeline::new().aggregate(Fold::Mean));
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(
            json["pipeline"],
            json!({"functions": [{"name": "aggregation", "arguments": ["mean"], "fold": "mean"}]})
        );
    }

    #[test]
    fn test_single_needs_timestamp_only_when_relative() {
        assert!(matches!(
            Single::new(DirectionFunction::Before, None),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            Single::new(
                DirectionFunction::Latest,
                Some(t("2012-01-01T00:00:00.000+00:00"))
            ),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(
            Single::new(DirectionFunction::Latest, None).unwrap(),
            Single::latest()
        );
    }

    #[test]
    fn test_single_wire_form() {
        let single = Single::new(
            DirectionFunction::Before,
            Some(t("2012-01-01T00:00:00.000-06:00")),
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(single).unwrap(),
            json!({"function": "before", "timestamp": "2012-01-01T00:00:00.000-06:00"})
        );
        assert_eq!(
            serde_json::to_value(Single::latest()).unwrap(),
            json!({"function": "latest"})
        );
    }

    #[test]
    fn test_query_decodes_by_action_field() {
        let find: Query = serde_json::from_value(json!({
            "search": {"select": "devices", "filters": {"devices": {"key": "d1"}}},
            "find": {"quantifier": "all"}
        }))
        .unwrap();
        assert!(matches!(find, Query::Find(_)));
        assert_eq!(find.search().select, ObjectType::Devices);

        let single: Query = serde_json::from_value(json!({
            "search": {"select": "sensors", "filters": {"devices": "any"}},
            "single": {"function": "earliest"}
        }))
        .unwrap();
        assert_eq!(
            single,
            Query::Single(SingleQuery::new(
                Search::new(ObjectType::Sensors, Selection::devices(Selector::All)),
                Single::earliest()
            ))
        );
    }
}
