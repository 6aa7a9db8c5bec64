//! Trait abstraction over the remote record store.
//!
//! This module provides the [`RecordStore`] trait that abstracts over the
//! HTTP store client and the in-memory mock used for testing.

use async_trait::async_trait;

use co2dash_types::{DayBoundary, DayKey, Record};

use crate::error::Result;

/// `count` value meaning "every record of the day" rather than a limit.
pub const ALL_RECORDS: u32 = 0;

/// Trait abstracting the three store queries the dashboard consumes.
///
/// Every method is a single non-blocking request; implementations must not
/// retry internally.
///
/// # Example
///
/// ```ignore
/// use co2dash_core::{RecordStore, Result};
///
/// async fn newest_id<S: RecordStore>(store: &S) -> Result<Option<i64>> {
///     Ok(store.fetch_incremental(0).await?.last().map(|r| r.id))
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the markers of every contiguous range of stored data.
    async fn fetch_day_boundaries(&self) -> Result<Vec<DayBoundary>>;

    /// Fetch the records of one calendar day, ascending by id.
    ///
    /// `count = ALL_RECORDS` (0) returns the whole day; any other value
    /// returns at most the latest `count` records.
    async fn fetch_day_records(&self, day: DayKey, count: u32) -> Result<Vec<Record>>;

    /// Fetch every record with `id > last_id`, ascending by id.
    async fn fetch_incremental(&self, last_id: i64) -> Result<Vec<Record>>;
}
