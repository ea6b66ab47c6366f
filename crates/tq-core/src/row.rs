//! # Row — one instant across many streams
//!
//! `data` is sparse: a missing device or sensor means "no reading at this
//! instant", never zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::DataPoint;
use crate::time::{zoned, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(with = "zoned")]
    pub t: Timestamp,
    #[serde(default)]
    pub data: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Row {
    pub fn new(t: Timestamp) -> Self {
        Self {
            t,
            data: BTreeMap::new(),
        }
    }

    pub fn with_value(
        mut self,
        device: impl Into<String>,
        sensor: impl Into<String>,
        v: f64,
    ) -> Self {
        self.data
            .entry(device.into())
            .or_default()
            .insert(sensor.into(), v);
        self
    }

    /// All readings of one device at this instant.
    pub fn get(&self, device: &str) -> Option<&BTreeMap<String, f64>> {
        self.data.get(device)
    }

    pub fn get_sensor(&self, device: &str, sensor: &str) -> Option<f64> {
        self.data.get(device)?.get(sensor).copied()
    }

    pub fn has_sensor(&self, device: &str, sensor: &str) -> bool {
        self.get_sensor(device, sensor).is_some()
    }

    /// Every present `(device, sensor, point)` cell, device then sensor order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, DataPoint)> + '_ {
        let t = self.t;
        self.data.iter().flat_map(move |(device, sensors)| {
            sensors
                .iter()
                .map(move |(sensor, v)| (device.as_str(), sensor.as_str(), DataPoint::new(t, *v)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_zoned;
    use serde_json::json;

    fn row() -> Row {
        serde_json::from_value(json!({
            "t": "2012-01-01T00:00:01.000+00:00",
            "data": {
                "d1": {"temp": 21.5, "humidity": 40.0},
                "d2": {"temp": 19.0}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_sparse_lookup() {
        let r = row();
        assert_eq!(r.get_sensor("d1", "temp"), Some(21.5));
        assert_eq!(r.get_sensor("d2", "humidity"), None);
        assert_eq!(r.get_sensor("d3", "temp"), None);
        assert!(r.has_sensor("d1", "humidity"));
        assert!(!r.has_sensor("d2", "humidity"));
        assert!(r.get("d3").is_none());
    }

    #[test]
    fn test_zero_is_a_reading() {
        let t = parse_zoned("2012-01-01T00:00:01.000+00:00").unwrap();
        let r = Row::new(t).with_value("d1", "temp", 0.0);
        assert_eq!(r.get_sensor("d1", "temp"), Some(0.0));
    }

    #[test]
    fn test_cells_carry_row_timestamp() {
        let r = row();
        let cells: Vec<_> = r.cells().collect();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].0, "d1");
        assert_eq!(cells[0].1, "humidity");
        assert!(cells.iter().all(|(_, _, dp)| dp.t == r.t));
    }

    #[test]
    fn test_timestamp_round_trips_through_row() {
        let r = row();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["t"], "2012-01-01T00:00:01.000+00:00");
    }
}
