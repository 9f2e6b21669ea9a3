//! Synchronous client for the Honeycomb REST API.
//!
//! # Overview
//! Typed access to markers, triggers and boards. Every operation is a single
//! JSON-over-HTTP round trip authenticated with the `X-Honeycomb-Team`
//! header; nothing is cached and nothing is retried.
//!
//! # Design
//! - `Client` owns an immutable `Config` (API key, base URL, dataset,
//!   timeout), so independently configured clients can coexist.
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`).
//!   Building and decoding are pure; only `Client::execute` does I/O.
//! - Each resource (`Markers`, `Triggers`, `Boards`) is a thin typed facade
//!   borrowing the client.
//! - Failures are `ApiError` values; `ApiError::kind` gives the coarse
//!   category and `ApiError::NotFound` can be compared directly.
//!
//! ```no_run
//! use honeycomb_core::{Client, Config, MarkerCreateData};
//!
//! # fn main() -> honeycomb_core::Result<()> {
//! let client = Client::new(Config::new("my-api-key", "my-dataset"))?;
//! let marker = client.markers().create(&MarkerCreateData {
//!     message: Some("deploy #42".to_string()),
//!     ..Default::default()
//! })?;
//! println!("created marker {}", marker.id);
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod marker;
pub mod query;
pub mod trigger;

pub use board::{Board, BoardQuery, BoardStyle, Boards};
pub use client::Client;
pub use config::{Config, DEFAULT_API_URL};
pub use error::{ApiError, ErrorKind, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use marker::{Marker, MarkerCreateData, Markers};
pub use query::{
    CalculationOp, CalculationSpec, FilterCombination, FilterOp, FilterSpec, OrderSpec, QuerySpec, SortOrder,
};
pub use trigger::{
    RecipientType, Trigger, TriggerRecipient, TriggerThreshold, TriggerThresholdOp, Triggers,
};
