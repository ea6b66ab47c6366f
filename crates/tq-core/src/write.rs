//! # Writes, deletes and upsert results

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{DataPoint, MultiDataPoint};
use crate::time::{zoned, Timestamp};

/// Points to write, grouped device -> sensor -> ordered points.
///
/// Encodes as `{"<device>": {"<sensor>": [{"t", "v"}, ..]}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteRequest {
    data: BTreeMap<String, BTreeMap<String, Vec<DataPoint>>>,
}

impl WriteRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, device: &str, sensor: &str, point: DataPoint) -> Self {
        self.points_mut(device, sensor).push(point);
        self
    }

    /// Appends after any points already queued for the stream.
    pub fn add_all(
        mut self,
        device: &str,
        sensor: &str,
        points: impl IntoIterator<Item = DataPoint>,
    ) -> Self {
        self.points_mut(device, sensor).extend(points);
        self
    }

    /// Spread a multi-sensor reading into one point per sensor.
    pub fn add_multi(mut self, device: &str, point: &MultiDataPoint) -> Self {
        for (sensor, v) in &point.vs {
            self.points_mut(device, sensor)
                .push(DataPoint::new(point.t, *v));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn points(&self, device: &str, sensor: &str) -> Option<&[DataPoint]> {
        self.data.get(device)?.get(sensor).map(Vec::as_slice)
    }

    /// Total number of points across every stream.
    pub fn len(&self) -> usize {
        self.data
            .values()
            .flat_map(|sensors| sensors.values())
            .map(Vec::len)
            .sum()
    }

    fn points_mut(&mut self, device: &str, sensor: &str) -> &mut Vec<DataPoint> {
        self.data
            .entry(device.to_string())
            .or_default()
            .entry(sensor.to_string())
            .or_default()
    }
}

/// Body of a data point delete: the inclusive time range to drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRange {
    #[serde(with = "zoned")]
    pub start: Timestamp,
    #[serde(with = "zoned")]
    pub stop: Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    pub deleted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    Existing,
    Modified,
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_state: DeviceState,
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Per-device outcome of a write that may create devices on the fly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpsertResponse {
    statuses: BTreeMap<String, DeviceStatus>,
}

impl UpsertResponse {
    pub fn get(&self, device: &str) -> Option<&DeviceStatus> {
        self.statuses.get(device)
    }

    pub fn is_success(&self) -> bool {
        self.statuses.values().all(|s| s.success)
    }

    /// At least one device went through.
    pub fn is_partial_success(&self) -> bool {
        self.statuses.values().any(|s| s.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &DeviceStatus)> {
        self.statuses
            .iter()
            .filter(|(_, s)| !s.success)
            .map(|(k, s)| (k.as_str(), s))
    }

    pub fn with_state(&self, state: DeviceState) -> impl Iterator<Item = (&str, &DeviceStatus)> {
        self.statuses
            .iter()
            .filter(move |(_, s)| s.device_state == state)
            .map(|(k, s)| (k.as_str(), s))
    }

    pub fn existing(&self) -> impl Iterator<Item = (&str, &DeviceStatus)> {
        self.with_state(DeviceState::Existing)
    }

    pub fn created(&self) -> impl Iterator<Item = (&str, &DeviceStatus)> {
        self.with_state(DeviceState::Created)
    }

    pub fn modified(&self) -> impl Iterator<Item = (&str, &DeviceStatus)> {
        self.with_state(DeviceState::Modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_zoned;
    use serde_json::json;

    fn t(raw: &str) -> Timestamp {
        parse_zoned(raw).unwrap()
    }

    #[test]
    fn test_write_request_groups_by_device_and_sensor() {
        let t1 = t("2012-01-01T01:00:00.000+00:00");
        let t2 = t("2012-01-01T02:00:00.000+00:00");
        let req = WriteRequest::new()
            .add("d1", "temp", DataPoint::new(t1, 1.0))
            .add_all("d1", "temp", [DataPoint::new(t2, 2.0)])
            .add("d2", "hum", DataPoint::new(t1, 3.0));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "d1": {"temp": [
                    {"t": "2012-01-01T01:00:00.000+00:00", "v": 1.0},
                    {"t": "2012-01-01T02:00:00.000+00:00", "v": 2.0}
                ]},
                "d2": {"hum": [{"t": "2012-01-01T01:00:00.000+00:00", "v": 3.0}]}
            })
        );
        assert_eq!(req.len(), 3);
    }

    #[test]
    fn test_add_multi_spreads_sensors() {
        let t1 = t("2012-01-01T01:00:00.000+00:00");
        let mdp = MultiDataPoint::new(t1)
            .with_value("temp", 20.0)
            .with_value("hum", 45.0);
        let req = WriteRequest::new().add_multi("d1", &mdp);
        assert_eq!(req.points("d1", "temp"), Some(&[DataPoint::new(t1, 20.0)][..]));
        assert_eq!(req.points("d1", "hum"), Some(&[DataPoint::new(t1, 45.0)][..]));
        assert_eq!(req.points("d2", "hum"), None);
    }

    #[test]
    fn test_upsert_response() {
        let resp: UpsertResponse = serde_json::from_value(json!({
            "device1": {"device_state": "existing", "message": null, "success": true},
            "device2": {"device_state": "created", "success": true},
            "device3": {"device_state": "modified", "message": "quota", "success": false}
        }))
        .unwrap();

        assert!(!resp.is_success());
        assert!(resp.is_partial_success());
        assert_eq!(resp.existing().map(|(k, _)| k).collect::<Vec<_>>(), ["device1"]);
        assert_eq!(resp.created().map(|(k, _)| k).collect::<Vec<_>>(), ["device2"]);
        let failed: Vec<_> = resp.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "device3");
        assert_eq!(failed[0].1.message.as_deref(), Some("quota"));
        assert_eq!(
            resp.get("device3").map(|s| s.device_state),
            Some(DeviceState::Modified)
        );
    }

    #[test]
    fn test_delete_range_wire_form() {
        let range = DeleteRange {
            start: t("2012-01-01T00:00:00.000+00:00"),
            stop: t("2012-02-01T00:00:00.000+00:00"),
        };
        assert_eq!(
            serde_json::to_value(&range).unwrap(),
            json!({"start": "2012-01-01T00:00:00.000+00:00", "stop": "2012-02-01T00:00:00.000+00:00"})
        );
        let summary: DeleteSummary = serde_json::from_value(json!({"deleted": 42})).unwrap();
        assert_eq!(summary.deleted, 42);
    }
}
