//! # Row views
//!
//! Read-only projections of a `Cursor<Row>`. Each one walks a fresh pass
//! over the cursor; the grouping views gather in one pass and stop at the
//! first page error.

use std::collections::BTreeMap;

use tq_core::{DataPoint, Result, Row};

use crate::cursor::Cursor;

/// One present cell of a row: device key, sensor key and the reading.
pub type Cell = (String, String, DataPoint);

impl<'a> Cursor<'a, Row> {
    /// Every present cell, row by row. Lazy across pages.
    pub fn flatten(&self) -> impl Iterator<Item = Result<Cell>> + 'a {
        self.iter().flat_map(|row| match row {
            Ok(row) => row
                .cells()
                .map(|(device, sensor, point)| Ok((device.to_string(), sensor.to_string(), point)))
                .collect::<Vec<_>>(),
            Err(e) => vec![Err(e)],
        })
    }

    /// The readings of one stream in row order. Rows without that
    /// device/sensor pair contribute nothing.
    pub fn stream_for_device_and_sensor(
        &self,
        device: &str,
        sensor: &str,
    ) -> impl Iterator<Item = Result<DataPoint>> + 'a {
        let (device, sensor) = (device.to_string(), sensor.to_string());
        self.iter().filter_map(move |row| match row {
            Ok(row) => row
                .get_sensor(&device, &sensor)
                .map(|v| Ok(DataPoint::new(row.t, v))),
            Err(e) => Some(Err(e)),
        })
    }

    /// Device -> `(sensor, point)` in row order.
    pub fn points_by_device(&self) -> Result<BTreeMap<String, Vec<(String, DataPoint)>>> {
        let mut out: BTreeMap<String, Vec<(String, DataPoint)>> = BTreeMap::new();
        for cell in self.flatten() {
            let (device, sensor, point) = cell?;
            out.entry(device).or_default().push((sensor, point));
        }
        Ok(out)
    }

    /// `(device, sensor)` -> points in row order.
    pub fn points_by_device_and_sensor(
        &self,
    ) -> Result<BTreeMap<(String, String), Vec<DataPoint>>> {
        let mut out: BTreeMap<(String, String), Vec<DataPoint>> = BTreeMap::new();
        for cell in self.flatten() {
            let (device, sensor, point) = cell?;
            out.entry((device, sensor)).or_default().push(point);
        }
        Ok(out)
    }

    /// Device -> sensor -> points in row order.
    pub fn points_by_stream(&self) -> Result<BTreeMap<String, BTreeMap<String, Vec<DataPoint>>>> {
        let mut out: BTreeMap<String, BTreeMap<String, Vec<DataPoint>>> = BTreeMap::new();
        for cell in self.flatten() {
            let (device, sensor, point) = cell?;
            out.entry(device)
                .or_default()
                .entry(sensor)
                .or_default()
                .push(point);
        }
        Ok(out)
    }
}
