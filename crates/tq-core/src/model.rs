//! # Domain objects
//!
//! Devices own sensors; a sensor is one stream of [`DataPoint`]s.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::selector::Selectable;
use crate::time::{zoned, Timestamp};

/// One reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(with = "zoned")]
    pub t: Timestamp,
    pub v: f64,
}

impl DataPoint {
    pub fn new(t: Timestamp, v: f64) -> Self {
        Self { t, v }
    }
}

/// Readings for several sensors of one device taken at the same instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiDataPoint {
    #[serde(with = "zoned")]
    pub t: Timestamp,
    pub vs: BTreeMap<String, f64>,
}

impl MultiDataPoint {
    pub fn new(t: Timestamp) -> Self {
        Self {
            t,
            vs: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, sensor: impl Into<String>, v: f64) -> Self {
        self.vs.insert(sensor.into(), v);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Sensor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub sensors: Vec<Sensor>,
}

impl Device {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_sensor(mut self, sensor: Sensor) -> Self {
        self.sensors.push(sensor);
        self
    }

    pub fn sensor(&self, key: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.key == key)
    }
}

impl Selectable for Device {
    fn key(&self) -> &str {
        &self.key
    }
    fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

impl Selectable for Sensor {
    fn key(&self) -> &str {
        &self.key
    }
    fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}
