//! # Selector — predicates over devices and sensors
//!
//! A selector is a closed sum type. The wire form carries no explicit
//! tag; the variant is recovered from which well-known field is present:
//!
//! ```text
//! "all"                       -> All     ("*" and "any" also accepted)
//! {"key": k}                  -> Key
//! {"attribute_key": k}        -> AttributeKey
//! {"attributes": {k: v, ..}}  -> Attributes
//! {"and": [..]}               -> And
//! {"or": [..]}                -> Or
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// The two kinds of object a selector can scope.
///
/// Ordered `Devices < Sensors`, which fixes the key order of an encoded
/// [`Selection`](crate::Selection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Devices,
    Sensors,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Devices => "devices",
            ObjectType::Sensors => "sensors",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything a selector can be evaluated against.
pub trait Selectable {
    fn key(&self) -> &str;
    fn attributes(&self) -> &BTreeMap<String, String>;
}

/// A predicate over devices or sensors.
///
/// Build composites with [`Selector::and`] and [`Selector::or`], which
/// reject an empty child list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every object.
    All,
    /// The object whose key is exactly this.
    Key(String),
    /// Objects carrying this attribute name, whatever its value.
    AttributeKey(String),
    /// Objects whose attributes include every listed pair.
    Attributes(BTreeMap<String, String>),
    /// Never empty when built through [`Selector::and`].
    And(Vec<Selector>),
    /// Never empty when built through [`Selector::or`].
    Or(Vec<Selector>),
}

const FIELDS: [&str; 5] = ["key", "attribute_key", "attributes", "and", "or"];

impl Selector {
    pub fn all() -> Self {
        Selector::All
    }

    pub fn key(key: impl Into<String>) -> Self {
        Selector::Key(key.into())
    }

    pub fn attribute_key(key: impl Into<String>) -> Self {
        Selector::AttributeKey(key.into())
    }

    pub fn attributes<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Selector::Attributes(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Shorthand for a single key/value [`Selector::Attributes`].
    pub fn attribute(key: impl Into<String>, value: impl Into<String>) -> Self {
        Selector::Attributes(BTreeMap::from([(key.into(), value.into())]))
    }

    /// Intersection of `children`. An empty list is an [`Error::InvalidArgument`].
    pub fn and(children: Vec<Selector>) -> Result<Self> {
        if children.is_empty() {
            return Err(Error::InvalidArgument(
                "an 'and' selector needs at least one child".into(),
            ));
        }
        Ok(Selector::And(children))
    }

    /// Union of `children`. An empty list is an [`Error::InvalidArgument`].
    pub fn or(children: Vec<Selector>) -> Result<Self> {
        if children.is_empty() {
            return Err(Error::InvalidArgument(
                "an 'or' selector needs at least one child".into(),
            ));
        }
        Ok(Selector::Or(children))
    }

    /// Evaluate the predicate locally.
    ///
    /// `And` is intersection and `Or` is union over the matched objects.
    /// `Attributes` matches when the object's attributes are a superset.
    pub fn matches<T: Selectable + ?Sized>(&self, object: &T) -> bool {
        match self {
            Selector::All => true,
            Selector::Key(key) => object.key() == key,
            Selector::AttributeKey(key) => object.attributes().contains_key(key),
            Selector::Attributes(wanted) => wanted
                .iter()
                .all(|(k, v)| object.attributes().get(k) == Some(v)),
            Selector::And(children) => children.iter().all(|s| s.matches(object)),
            Selector::Or(children) => children.iter().any(|s| s.matches(object)),
        }
    }

    // =========================================================================
    // Wire encoding
    // =========================================================================

    /// Wire form; child order of `and`/`or` is kept.
    pub fn to_value(&self) -> Value {
        let single = |field: &str, body: Value| {
            let mut map = Map::with_capacity(1);
            map.insert(field.to_string(), body);
            Value::Object(map)
        };
        match self {
            Selector::All => Value::String("all".into()),
            Selector::Key(key) => single("key", Value::String(key.clone())),
            Selector::AttributeKey(key) => single("attribute_key", Value::String(key.clone())),
            Selector::Attributes(attrs) => single(
                "attributes",
                Value::Object(
                    attrs
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect(),
                ),
            ),
            Selector::And(children) => {
                single("and", children.iter().map(Selector::to_value).collect())
            }
            Selector::Or(children) => {
                single("or", children.iter().map(Selector::to_value).collect())
            }
        }
    }

    /// Inverse of [`Selector::to_value`]. Anything that is not exactly one
    /// recognised shape is an [`Error::InvalidSelector`].
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(token) => match token.as_str() {
                "all" | "*" | "any" => Ok(Selector::All),
                other => Err(Error::InvalidSelector(format!(
                    "unknown selector token '{}'",
                    other
                ))),
            },
            Value::Object(map) => {
                let mut present = FIELDS.iter().filter(|f| map.contains_key(**f));
                let field = match (present.next(), present.next()) {
                    (Some(field), None) => *field,
                    (None, _) => {
                        return Err(Error::InvalidSelector(format!(
                            "no selector field in {}",
                            value
                        )))
                    }
                    (Some(_), Some(_)) => {
                        return Err(Error::InvalidSelector(format!(
                            "more than one selector field in {}",
                            value
                        )))
                    }
                };
                let body = &map[field];
                match field {
                    "key" => Ok(Selector::Key(expect_str(field, body)?)),
                    "attribute_key" => Ok(Selector::AttributeKey(expect_str(field, body)?)),
                    "attributes" => decode_attributes(body).map(Selector::Attributes),
                    "and" => decode_children(field, body).map(Selector::And),
                    _ => decode_children(field, body).map(Selector::Or),
                }
            }
            other => Err(Error::InvalidSelector(format!(
                "expected a string or object, got {}",
                other
            ))),
        }
    }
}

fn expect_str(field: &str, body: &Value) -> Result<String> {
    body.as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidSelector(format!("'{}' must be a string", field)))
}

fn decode_attributes(body: &Value) -> Result<BTreeMap<String, String>> {
    let map = body
        .as_object()
        .ok_or_else(|| Error::InvalidSelector("'attributes' must be an object".into()))?;
    map.iter()
        .map(|(k, v)| expect_str(k, v).map(|v| (k.clone(), v)))
        .collect()
}

fn decode_children(field: &str, body: &Value) -> Result<Vec<Selector>> {
    let items = body
        .as_array()
        .ok_or_else(|| Error::InvalidSelector(format!("'{}' must be an array", field)))?;
    if items.is_empty() {
        return Err(Error::InvalidSelector(format!("'{}' is empty", field)));
    }
    items.iter().map(Selector::from_value).collect()
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Selector::from_value(&value).map_err(serde::de::Error::custom)
    }
}
