//! Core library for the co2dash environmental dashboard.
//!
//! This crate drives a CO₂ and temperature dashboard backed by a remote
//! record store: it builds the list of selectable days, loads a day's
//! records into a chart, tracks the minimum and maximum of both channels,
//! and keeps today's chart current by polling for new records.
//!
//! # Features
//!
//! - **Day catalog**: Expand sparse boundary markers into a gap-free day list
//! - **Sessions**: Start, replace and tear down a day's chart atomically
//! - **Live sync**: Incremental polling with a high-watermark, cancelled on restart
//! - **Aggregates**: Running min/max with the panel's display formatting
//! - **Store access**: HTTP client for the store, plus an in-memory mock
//!
//! # Session Lifecycle
//!
//! | Phase | Meaning |
//! |-------|---------|
//! | Idle | Nothing loaded |
//! | Loading | Waiting for the day's records |
//! | Empty | Day has no records, "No data available" shown |
//! | Historic | Past day loaded, no updates |
//! | Live | Today loaded, polled for new records |
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use co2dash_core::{DayCatalog, DaySelector, RecordingRenderer, SessionController, SystemClock};
//! use co2dash_core::client::StoreClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(StoreClient::new("http://localhost/co2")?);
//!
//!     // Build the picker
//!     let catalog = DayCatalog::fetch(store.as_ref(), &SystemClock).await?;
//!     let selector = DaySelector::new(catalog);
//!
//!     // Load the newest day
//!     let mut controller = SessionController::new(store, RecordingRenderer::new());
//!     let phase = controller.start_selected(&selector).await?;
//!     println!("{:?}", phase);
//!     for line in controller.panel().lines() {
//!         println!("{}", line);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod catalog;
pub mod chart;
pub mod client;
pub mod clock;
pub mod error;
pub mod live;
pub mod mock;
pub mod selector;
pub mod session;
pub mod store;

// Core exports
pub use aggregate::{Aggregates, MinMax, compute_min_max};
pub use catalog::{DayCatalog, build_catalog};
pub use chart::{AxisConfig, ChartDataModel, ChartRenderer, RecordingRenderer};
pub use client::{Endpoints, StoreClient, StoreClientError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use live::LiveSyncHandle;
pub use mock::{MockStore, MockStoreBuilder};
pub use selector::DaySelector;
pub use session::{
    Increment, Mode, ReadingsPanel, SessionController, SessionOptions, SessionPhase,
    SessionState,
};
pub use store::{ALL_RECORDS, RecordStore};

// Re-export from co2dash-types
pub use co2dash_types::{Channel, DayBoundary, DayKey, Record, SeriesPoint};
