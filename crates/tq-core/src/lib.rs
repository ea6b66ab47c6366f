//! # tq-core — The value model of the TempoIQ client
//!
//! Everything that travels over the wire, and nothing that moves it.
//!
//! - [`Selector`] / [`Selection`] — which devices and sensors a query touches.
//! - [`Pipeline`] — server-side [`Rollup`]s and [`Aggregation`]s applied in order.
//! - [`Query`] — a search plus an action (find, read, single value).
//! - [`Row`], [`DataPoint`], [`Device`], [`Sensor`] — what comes back.
//!
//! All types here are immutable values with structural equality. The
//! paging engine that fetches them lives in `tq-client`.

pub mod error;
pub mod fold;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod row;
pub mod selection;
pub mod selector;
pub mod time;
pub mod write;

pub use error::{Error, Result};
pub use fold::Fold;
pub use model::{DataPoint, Device, MultiDataPoint, Sensor};
pub use pipeline::{Aggregation, Pipeline, PipelineFunction, Rollup};
pub use query::{
    DirectionFunction, Find, FindQuery, Quantifier, Query, Read, ReadQuery, Search, Single,
    SingleQuery,
};
pub use row::Row;
pub use selection::Selection;
pub use selector::{ObjectType, Selectable, Selector};
pub use time::{format_zoned, parse_zoned, Period, Timestamp};
pub use write::{
    DeleteRange, DeleteSummary, DeviceState, DeviceStatus, UpsertResponse, WriteRequest,
};
