//! # Fold — reduction functions
//!
//! The closed set of reductions the backend applies inside rollups and
//! aggregations. Always lowercase on the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fold {
    Count,
    First,
    Max,
    Mean,
    Min,
    Mult,
    Range,
    StdDev,
    Sum,
    Variance,
}

impl Fold {
    pub const ALL: [Fold; 10] = [
        Fold::Count,
        Fold::First,
        Fold::Max,
        Fold::Mean,
        Fold::Min,
        Fold::Mult,
        Fold::Range,
        Fold::StdDev,
        Fold::Sum,
        Fold::Variance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Fold::Count => "count",
            Fold::First => "first",
            Fold::Max => "max",
            Fold::Mean => "mean",
            Fold::Min => "min",
            Fold::Mult => "mult",
            Fold::Range => "range",
            Fold::StdDev => "stddev",
            Fold::Sum => "sum",
            Fold::Variance => "variance",
        }
    }
}

impl fmt::Display for Fold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive, so `--aggregate Mean` works from the command line.
impl FromStr for Fold {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fold::ALL
            .into_iter()
            .find(|fold| fold.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown fold '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_name_matches_display() {
        for fold in Fold::ALL {
            let json = serde_json::to_value(fold).unwrap();
            assert_eq!(json, serde_json::Value::String(fold.to_string()));
        }
    }

    #[test]
    fn test_stddev_is_one_word() {
        assert_eq!(Fold::StdDev.as_str(), "stddev");
        let back: Fold = serde_json::from_str("\"stddev\"").unwrap();
        assert_eq!(back, Fold::StdDev);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Mean".parse::<Fold>().unwrap(), Fold::Mean);
        assert_eq!("SUM".parse::<Fold>().unwrap(), Fold::Sum);
        assert!(matches!(
            "median".parse::<Fold>(),
            Err(Error::InvalidArgument(_))
        ));
    }
}
