//! # Pipeline — server-side transforms
//!
//! An ordered list of [`PipelineFunction`]s. The backend applies them in
//! sequence, each stage consuming the previous stage's output:
//!
//! - [`Rollup`]: bucket one stream into `period`-wide windows anchored at
//!   `start` and fold each bucket.
//! - [`Aggregation`]: fold parallel streams into one at shared timestamps.
//!
//! Every function travels as `{"name", "arguments", ..type fields}`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fold::Fold;
use crate::time::{format_zoned, parse_zoned, zoned, Period, Timestamp};

/// Fold one stream into fixed-width buckets.
///
/// Structural equality on every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollup {
    /// Bucket width; never zero.
    period: Period,
    /// Reduction applied inside each bucket.
    fold: Fold,
    /// Anchor of the first bucket.
    start: Timestamp,
}

impl Rollup {
    /// Bucket `k` spans `[start + k*period, start + (k+1)*period)`.
    pub fn new(period: Period, fold: Fold, start: Timestamp) -> Result<Self> {
        if period.is_zero() {
            return Err(Error::InvalidArgument(
                "rollup period must be positive".into(),
            ));
        }
        Ok(Self {
            period,
            fold,
            start,
        })
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn fold(&self) -> Fold {
        self.fold
    }

    pub fn start(&self) -> &Timestamp {
        &self.start
    }

    /// `[fold, period, start]` as the backend reads them positionally.
    pub fn arguments(&self) -> Vec<String> {
        vec![
            self.fold.to_string(),
            self.period.to_string(),
            format_zoned(&self.start),
        ]
    }
}

/// Fold every selected stream into a single stream, point by point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregation {
    fold: Fold,
}

impl Aggregation {
    pub fn new(fold: Fold) -> Self {
        Self { fold }
    }

    pub fn fold(&self) -> Fold {
        self.fold
    }

    /// `[fold]`.
    pub fn arguments(&self) -> Vec<String> {
        vec![self.fold.to_string()]
    }
}

/// One pipeline stage. Decoded by its `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireFunction", try_from = "WireFunction")]
pub enum PipelineFunction {
    Rollup(Rollup),
    Aggregation(Aggregation),
}

impl PipelineFunction {
    /// Wire name: `"rollup"` or `"aggregation"`.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineFunction::Rollup(_) => "rollup",
            PipelineFunction::Aggregation(_) => "aggregation",
        }
    }

    pub fn arguments(&self) -> Vec<String> {
        match self {
            PipelineFunction::Rollup(r) => r.arguments(),
            PipelineFunction::Aggregation(a) => a.arguments(),
        }
    }
}

impl From<Rollup> for PipelineFunction {
    fn from(r: Rollup) -> Self {
        PipelineFunction::Rollup(r)
    }
}

impl From<Aggregation> for PipelineFunction {
    fn from(a: Aggregation) -> Self {
        PipelineFunction::Aggregation(a)
    }
}

// =============================================================================
// Wire shape
// =============================================================================

#[derive(Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fold: Option<Fold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "zoned::option")]
    start: Option<Timestamp>,
}

impl From<PipelineFunction> for WireFunction {
    fn from(function: PipelineFunction) -> Self {
        let name = function.name().to_string();
        let arguments = function.arguments();
        match function {
            PipelineFunction::Rollup(r) => WireFunction {
                name,
                arguments,
                fold: None,
                period: Some(r.period),
                start: Some(r.start),
            },
            PipelineFunction::Aggregation(a) => WireFunction {
                name,
                arguments,
                fold: Some(a.fold),
                period: None,
                start: None,
            },
        }
    }
}

impl TryFrom<WireFunction> for PipelineFunction {
    type Error = Error;

    /// Type fields win; positional `arguments` fill in whatever is missing.
    fn try_from(wire: WireFunction) -> Result<Self> {
        let fold = match wire.fold {
            Some(fold) => fold,
            None => argument(&wire.arguments, 0, "fold")?.parse()?,
        };
        match wire.name.as_str() {
            "rollup" => {
                let period = match wire.period {
                    Some(period) => period,
                    None => argument(&wire.arguments, 1, "period")?.parse()?,
                };
                let start = match wire.start {
                    Some(start) => start,
                    None => parse_zoned(argument(&wire.arguments, 2, "start")?)?,
                };
                Rollup::new(period, fold, start).map(PipelineFunction::Rollup)
            }
            "aggregation" => Ok(PipelineFunction::Aggregation(Aggregation::new(fold))),
            other => Err(Error::Decode(format!(
                "unknown pipeline function '{}'",
                other
            ))),
        }
    }
}

fn argument<'a>(arguments: &'a [String], index: usize, what: &str) -> Result<&'a str> {
    arguments
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| Error::Decode(format!("pipeline function is missing its {}", what)))
}

// =============================================================================
// Pipeline
// =============================================================================

/// Ordered server-side transforms attached to a read or single-value query.
///
/// Encodes as `{"functions": [..]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    functions: Vec<PipelineFunction>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append; functions run in the order they were added.
    pub fn add_function(mut self, function: impl Into<PipelineFunction>) -> Self {
        self.functions.push(function.into());
        self
    }

    /// Append a [`Rollup`]. A zero `period` is an [`Error::InvalidArgument`].
    pub fn rollup(self, period: Period, fold: Fold, start: Timestamp) -> Result<Self> {
        Ok(self.add_function(Rollup::new(period, fold, start)?))
    }

    /// Append an [`Aggregation`].
    pub fn aggregate(self, fold: Fold) -> Self {
        self.add_function(Aggregation::new(fold))
    }

    pub fn functions(&self) -> &[PipelineFunction] {
        &self.functions
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
