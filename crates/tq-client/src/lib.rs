//! # tq-client — The Engine
//!
//! Turns `tq-core` values into requests and streams the results back.
//!
//! - [`Executor`] — the single "send one request" capability.
//! - [`Segment`] / [`PageLoader`] / [`Cursor`] — lazy iteration over
//!   server-paginated results, one page fetched at a time.
//! - [`Response`] — status envelope with multi-status for partial success.
//! - [`Client`] — device CRUD, writes, reads and deletes over any executor,
//!   with [`HttpExecutor`] as the blocking HTTPS default.
//!
//! ```no_run
//! use tq_client::{Client, ClientConfig, Selection, Selector};
//!
//! let config = ClientConfig::load(None)?;
//! let client = Client::from_config(&config)?;
//! for device in client.list_devices(Selection::devices(Selector::all()))?.iter() {
//!     println!("{}", device?.key);
//! }
//! # Ok::<(), tq_client::Error>(())
//! ```

pub mod client;
pub mod config;
pub mod cursor;
pub mod executor;
pub mod http;
pub mod page_loader;
pub mod response;
pub mod segment;
pub mod views;

#[cfg(test)]
mod testing;

pub use client::Client;
pub use config::{ClientConfig, Credentials};
pub use cursor::{Cursor, CursorIter};
pub use executor::{media, Executor, Method, RawResponse, Request};
pub use http::HttpExecutor;
pub use page_loader::{PageLoader, PageSource};
pub use response::{MultiStatus, Response, State, Status, Unit};
pub use segment::{NextPage, Segment};
pub use views::Cell;

pub use tq_core::*;
