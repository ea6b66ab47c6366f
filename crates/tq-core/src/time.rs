//! # Time on the wire
//!
//! Two string forms cross the wire and both must round-trip exactly:
//!
//! - **Zoned instants**: `yyyy-MM-ddTHH:mm:ss.fff` local date-time directly
//!   followed by a signed `HH:mm` offset, e.g. `2012-01-01T00:00:01.000-06:00`.
//! - **Periods**: ISO-8601 durations, e.g. `PT1M`, `P1D`, `PT1.5S`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// An instant together with the UTC offset it was observed in.
pub type Timestamp = DateTime<FixedOffset>;

const ZONED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Accepts any fraction width, including none.
const ZONED_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// Render a timestamp in the zoned-instant form (millisecond precision).
pub fn format_zoned(ts: &Timestamp) -> String {
    ts.format(ZONED_FORMAT).to_string()
}

/// Parse the zoned-instant form. RFC 3339 (`...Z`) is accepted as well,
/// since the backend echoes UTC instants that way in some responses.
pub fn parse_zoned(raw: &str) -> Result<Timestamp> {
    DateTime::parse_from_str(raw, ZONED_PARSE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map_err(|e| Error::Decode(format!("invalid timestamp '{}': {}", raw, e)))
}

/// `#[serde(with = "zoned")]` adapter for [`Timestamp`] fields.
pub mod zoned {
    use super::*;

    pub fn serialize<S: Serializer>(
        ts: &Timestamp,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_zoned(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_zoned(&raw).map_err(serde::de::Error::custom)
    }

    /// Same, for `Option<Timestamp>` fields.
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            ts: &Option<Timestamp>,
            serializer: S,
        ) -> std::result::Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_some(&format_zoned(ts)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> std::result::Result<Option<Timestamp>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| parse_zoned(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

// =============================================================================
// Period
// =============================================================================

/// A calendar-aware ISO-8601 period.
///
/// Components are kept separately (a month is not a fixed number of
/// seconds), so `P1M` and `P30D` are different periods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Period {
    years: u32,
    months: u32,
    weeks: u32,
    days: u32,
    hours: u32,
    minutes: u32,
    seconds: u32,
    /// Always `< 1000`.
    millis: u32,
}

impl Period {
    pub const fn from_years(years: u32) -> Self {
        Self { years, ..Self::ZERO }
    }

    pub const fn from_months(months: u32) -> Self {
        Self { months, ..Self::ZERO }
    }

    pub const fn from_weeks(weeks: u32) -> Self {
        Self { weeks, ..Self::ZERO }
    }

    pub const fn from_days(days: u32) -> Self {
        Self { days, ..Self::ZERO }
    }

    pub const fn from_hours(hours: u32) -> Self {
        Self { hours, ..Self::ZERO }
    }

    pub const fn from_minutes(minutes: u32) -> Self {
        Self { minutes, ..Self::ZERO }
    }

    pub const fn from_seconds(seconds: u32) -> Self {
        Self { seconds, ..Self::ZERO }
    }

    /// Whole seconds are carried into the seconds component.
    pub const fn from_millis(millis: u32) -> Self {
        Self {
            seconds: millis / 1000,
            millis: millis % 1000,
            ..Self::ZERO
        }
    }

    const ZERO: Self = Self {
        years: 0,
        months: 0,
        weeks: 0,
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        millis: 0,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    fn has_time_part(&self) -> bool {
        self.hours != 0 || self.minutes != 0 || self.seconds != 0 || self.millis != 0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        f.write_str("P")?;
        for (value, unit) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if value != 0 {
                write!(f, "{}{}", value, unit)?;
            }
        }
        if self.has_time_part() {
            f.write_str("T")?;
            if self.hours != 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes != 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.millis != 0 {
                let frac = format!("{:03}", self.millis);
                write!(f, "{}.{}S", self.seconds, frac.trim_end_matches('0'))?;
            } else if self.seconds != 0 {
                write!(f, "{}S", self.seconds)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let invalid = || Error::InvalidArgument(format!("invalid ISO-8601 period '{}'", raw));
        let body = raw.strip_prefix('P').ok_or_else(invalid)?;
        let (date, time) = match body.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (body, None),
        };
        if body.is_empty() || time == Some("") {
            return Err(invalid());
        }

        let mut period = Self::ZERO;
        for (number, unit) in designators(date).ok_or_else(invalid)? {
            let value: u32 = number.parse().map_err(|_| invalid())?;
            match unit {
                'Y' => period.years = value,
                'M' => period.months = value,
                'W' => period.weeks = value,
                'D' => period.days = value,
                _ => return Err(invalid()),
            }
        }

        for (number, unit) in designators(time.unwrap_or("")).ok_or_else(invalid)? {
            match unit {
                'H' => period.hours = number.parse().map_err(|_| invalid())?,
                'M' => period.minutes = number.parse().map_err(|_| invalid())?,
                'S' => {
                    let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
                    period.seconds = whole.parse().map_err(|_| invalid())?;
                    if !frac.is_empty() {
                        if frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                            return Err(invalid());
                        }
                        period.millis = format!("{:0<3}", frac).parse().map_err(|_| invalid())?;
                    }
                }
                _ => return Err(invalid()),
            }
        }

        Ok(period)
    }
}

/// Split `1Y2M` into `[("1", 'Y'), ("2", 'M')]`. `None` on a dangling
/// number or a designator with no number in front of it.
fn designators(s: &str) -> Option<Vec<(&str, char)>> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c.is_ascii_digit() || c == '.' {
            continue;
        }
        if i == start {
            return None;
        }
        out.push((&s[start..i], c));
        start = i + c.len_utf8();
    }
    (start == s.len()).then_some(out)
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
