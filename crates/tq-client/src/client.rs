//! # Client — the service surface
//!
//! | Operation              | Request                                    |
//! |------------------------|--------------------------------------------|
//! | `create_device`        | `POST v2/devices/`                         |
//! | `get_device`           | `GET v2/devices/<key>/`                    |
//! | `update_device`        | `PUT v2/devices/<key>/`                    |
//! | `find_devices`         | `GET v2/devices/query/` (paged)            |
//! | `delete_devices`       | `DELETE v2/devices/`                       |
//! | `write_data_points`    | `POST v2/write/`                           |
//! | `read_query`           | `GET v2/read/query/` (paged)               |
//! | `single`               | `GET v2/single/query/` (paged)             |
//! | `delete_data_points`   | `DELETE v2/devices/<d>/sensors/<s>/datapoints/` |
//!
//! Paged calls return a [`Cursor`] over the first segment; later pages
//! are `POST`ed to the same path as the cursor is consumed. Everything
//! else returns the [`Response`] envelope so partial success stays visible.

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::cursor::Cursor;
use crate::executor::{media, Executor, Method, Request};
use crate::http::HttpExecutor;
use crate::page_loader::PageSource;
use crate::response::{Response, State, Unit};
use crate::segment::Segment;
use tq_core::{
    DeleteRange, DeleteSummary, Device, Error, Find, FindQuery, MultiDataPoint, ObjectType, Pipeline,
    ReadQuery, Result, Row, Search, Selection, Single, SingleQuery, Timestamp, WriteRequest,
};

const DEVICES: &str = "v2/devices/";
const DEVICE_QUERY: &str = "v2/devices/query/";
const WRITE: &str = "v2/write/";
const READ_QUERY: &str = "v2/read/query/";
const SINGLE_QUERY: &str = "v2/single/query/";

fn device_path(key: &str) -> Result<String> {
    resource_path(&["v2", "devices", key])
}

fn datapoints_path(device: &str, sensor: &str) -> Result<String> {
    resource_path(&["v2", "devices", device, "sensors", sensor, "datapoints"])
}

/// Join `segments` into a relative path with a trailing slash, each segment
/// percent-encoded so a key can never spill into the query or fragment.
fn resource_path(segments: &[&str]) -> Result<String> {
    let mut url = Url::parse("http://localhost/")
        .map_err(|e| Error::InvalidArgument(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| Error::InvalidArgument("base URL cannot hold a path".into()))?
        .clear()
        .extend(segments)
        .push("");
    Ok(url.path().trim_start_matches('/').to_string())
}

/// High-level TempoIQ operations over any [`Executor`].
///
/// `Client::from_config` gives the blocking HTTPS default; tests pass a
/// scripted executor to [`Client::new`].
pub struct Client<E = HttpExecutor> {
    executor: E,
}

impl Client<HttpExecutor> {
    /// Build an [`HttpExecutor`] from `config` and wrap it.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(HttpExecutor::new(config)?))
    }
}

impl<E: Executor> Client<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    // =========================================================================
    // Devices
    // =========================================================================

    /// Create `device`; the backend echoes the stored device.
    pub fn create_device(&self, device: &Device) -> Result<Response<Device>> {
        let request = Request::new(Method::Post, DEVICES)
            .body(serde_json::to_value(device)?)
            .accept(media::DEVICE);
        self.send(request)
    }

    /// Fetch one device. A missing key is a `Failure` response with status 404.
    pub fn get_device(&self, key: &str) -> Result<Response<Device>> {
        self.send(Request::new(Method::Get, device_path(key)?).accept(media::DEVICE))
    }

    /// Replace the device stored under `device.key`.
    pub fn update_device(&self, device: &Device) -> Result<Response<Device>> {
        let request = Request::new(Method::Put, device_path(&device.key)?)
            .body(serde_json::to_value(device)?)
            .accept(media::DEVICE);
        self.send(request)
    }

    /// Every device matching `selection`.
    pub fn list_devices(&self, selection: Selection) -> Result<Cursor<'_, Device>> {
        let query = FindQuery::new(Search::new(ObjectType::Devices, selection), Find::all());
        self.find_devices(&query)
    }

    /// Paged device search with an explicit [`Find`] action.
    pub fn find_devices(&self, query: &FindQuery) -> Result<Cursor<'_, Device>> {
        self.paged(
            DEVICE_QUERY,
            query,
            media::DEVICE_QUERY,
            media::DEVICE_COLLECTION,
        )
    }

    /// Delete every device matching `selection`.
    pub fn delete_devices(&self, selection: Selection) -> Result<Response<DeleteSummary>> {
        let query = FindQuery::new(Search::new(ObjectType::Devices, selection), Find::all());
        let request = Request::new(Method::Delete, DEVICES)
            .body(serde_json::to_value(&query)?)
            .content_type(media::DEVICE_QUERY)
            .accept(media::JSON);
        self.send(request)
    }

    // =========================================================================
    // Data points
    // =========================================================================

    /// Write points for any number of devices and sensors in one request.
    /// A 207 reply comes back as `PartialSuccess` with its multi-status.
    pub fn write_data_points(&self, write: &WriteRequest) -> Result<Response<Unit>> {
        let request = Request::new(Method::Post, WRITE)
            .body(serde_json::to_value(write)?)
            .accept(media::JSON);
        self.send(request)
    }

    /// Write several multi-sensor readings for one device.
    pub fn write_device(&self, device: &str, points: &[MultiDataPoint]) -> Result<Response<Unit>> {
        let write = points
            .iter()
            .fold(WriteRequest::new(), |w, point| w.add_multi(device, point));
        self.write_data_points(&write)
    }

    /// Rows for the sensors scoped by `selection` over `[start, stop]`.
    pub fn read(
        &self,
        selection: Selection,
        start: Timestamp,
        stop: Timestamp,
        pipeline: Option<Pipeline>,
    ) -> Result<Cursor<'_, Row>> {
        let mut query = ReadQuery::new(
            Search::new(ObjectType::Sensors, selection),
            tq_core::Read::new(start, stop),
        );
        query.pipeline = pipeline;
        self.read_query(&query)
    }

    /// Paged read of a prepared [`ReadQuery`].
    pub fn read_query(&self, query: &ReadQuery) -> Result<Cursor<'_, Row>> {
        self.paged(
            READ_QUERY,
            query,
            media::DATAPOINT_QUERY,
            media::DATAPOINT_COLLECTION,
        )
    }

    /// The most recent reading of every selected sensor.
    pub fn latest(&self, selection: Selection) -> Result<Cursor<'_, Row>> {
        self.single(selection, Single::latest())
    }

    /// One value per selected sensor, chosen by `single`.
    pub fn single(&self, selection: Selection, single: Single) -> Result<Cursor<'_, Row>> {
        let query = SingleQuery::new(Search::new(ObjectType::Sensors, selection), single);
        self.single_query(&query)
    }

    /// Paged single-value lookup of a prepared [`SingleQuery`].
    pub fn single_query(&self, query: &SingleQuery) -> Result<Cursor<'_, Row>> {
        self.paged(
            SINGLE_QUERY,
            query,
            media::DATAPOINT_QUERY,
            media::DATAPOINT_COLLECTION,
        )
    }

    /// Delete one stream's points in `[start, stop]`.
    pub fn delete_data_points(
        &self,
        device: &str,
        sensor: &str,
        start: Timestamp,
        stop: Timestamp,
    ) -> Result<Response<DeleteSummary>> {
        let range = DeleteRange { start, stop };
        let request = Request::new(Method::Delete, datapoints_path(device, sensor)?)
            .body(serde_json::to_value(&range)?)
            .accept(media::JSON);
        self.send(request)
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    fn send<T: DeserializeOwned>(&self, request: Request) -> Result<Response<T>> {
        debug!(method = %request.method, path = %request.path, "request");
        let response = Response::from_raw(self.executor.execute(&request)?)?;
        match response.state() {
            State::Success => {}
            State::PartialSuccess => warn!(
                path = %request.path,
                failures = response.multi_status.failures().count(),
                "partial success"
            ),
            State::Failure => warn!(
                path = %request.path,
                status = response.status,
                message = %response.message,
                "request failed"
            ),
        }
        Ok(response)
    }

    /// First page by `GET` with the query as body; the cursor does the rest.
    fn paged<Q, T>(
        &self,
        path: &str,
        query: &Q,
        content_type: &str,
        accept: &str,
    ) -> Result<Cursor<'_, T>>
    where
        Q: Serialize,
        T: DeserializeOwned,
    {
        let request = Request::new(Method::Get, path)
            .body(serde_json::to_value(query)?)
            .content_type(content_type)
            .accept(accept);
        let first: Segment<T> = self.send(request)?.into_value()?;
        Ok(Cursor::new(
            first,
            PageSource::new(&self.executor, path, content_type, accept),
        ))
    }
}
