//! In-memory record store for testing.
//!
//! The [`MockStore`] implements [`RecordStore`], so it can stand in for the
//! HTTP client anywhere a store is expected.
//!
//! # Features
//!
//! - **Failure injection**: fail every request, or only the next `n`
//! - **Latency simulation**: delay every response
//! - **Request accounting**: per-endpoint counters and the watermarks sent
//!   to the incremental endpoint

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use co2dash_types::{DayBoundary, DayKey, Record};

use crate::error::{Error, Result};
use crate::store::{ALL_RECORDS, RecordStore};

/// A mock record store.
///
/// # Example
///
/// ```
/// use co2dash_core::{MockStoreBuilder, RecordStore};
/// use co2dash_types::parse_timestamp;
/// use co2dash_types::Record;
///
/// #[tokio::main]
/// async fn main() {
///     let store = MockStoreBuilder::new()
///         .record(Record {
///             id: 1,
///             time: parse_timestamp("2024-01-02 08:00:00").unwrap(),
///             co2: 420.0,
///             temperature: 21.3,
///         })
///         .build();
///
///     let newer = store.fetch_incremental(0).await.unwrap();
///     assert_eq!(newer.len(), 1);
/// }
/// ```
pub struct MockStore {
    boundaries: RwLock<Vec<DayBoundary>>,
    records: RwLock<Vec<Record>>,
    should_fail: AtomicBool,
    fail_message: RwLock<String>,
    /// Number of requests left to fail before succeeding again.
    remaining_failures: AtomicU32,
    /// Simulated response latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
    boundary_requests: AtomicU32,
    day_requests: AtomicU32,
    incremental_requests: AtomicU32,
    watermarks: RwLock<Vec<i64>>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("should_fail", &self.should_fail.load(Ordering::Relaxed))
            .field("latency_ms", &self.latency_ms.load(Ordering::Relaxed))
            .field(
                "incremental_requests",
                &self.incremental_requests.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_data(Vec::new(), Vec::new())
    }

    fn with_data(boundaries: Vec<DayBoundary>, records: Vec<Record>) -> Self {
        Self {
            boundaries: RwLock::new(boundaries),
            records: RwLock::new(records),
            should_fail: AtomicBool::new(false),
            fail_message: RwLock::new("Mock failure".to_string()),
            remaining_failures: AtomicU32::new(0),
            latency_ms: AtomicU64::new(0),
            boundary_requests: AtomicU32::new(0),
            day_requests: AtomicU32::new(0),
            incremental_requests: AtomicU32::new(0),
            watermarks: RwLock::new(Vec::new()),
        }
    }

    async fn check_should_fail(&self, operation: &'static str) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        let transient = self
            .remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if transient || self.should_fail.load(Ordering::Relaxed) {
            return Err(Error::transport(
                operation,
                self.fail_message.read().await.clone(),
            ));
        }
        Ok(())
    }

    // --- Test control methods ---

    /// Append a record, as if the sensor had just reported.
    pub async fn push_record(&self, record: Record) {
        self.records.write().await.push(record);
    }

    /// Append several records.
    pub async fn add_records(&self, records: Vec<Record>) {
        self.records.write().await.extend(records);
    }

    /// Replace the boundary markers.
    pub async fn set_boundaries(&self, boundaries: Vec<DayBoundary>) {
        *self.boundaries.write().await = boundaries;
    }

    /// Make every request fail until reset.
    pub async fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(msg) = message {
            *self.fail_message.write().await = msg.to_string();
        }
    }

    /// Fail the next `count` requests, then succeed.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Get the number of remaining transient failures.
    pub fn remaining_failures(&self) -> u32 {
        self.remaining_failures.load(Ordering::Relaxed)
    }

    /// Delay every response by `latency`. `Duration::ZERO` disables it.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Requests made to the boundaries endpoint.
    pub fn boundary_requests(&self) -> u32 {
        self.boundary_requests.load(Ordering::Relaxed)
    }

    /// Requests made to the day endpoint.
    pub fn day_requests(&self) -> u32 {
        self.day_requests.load(Ordering::Relaxed)
    }

    /// Requests made to the incremental endpoint.
    pub fn incremental_requests(&self) -> u32 {
        self.incremental_requests.load(Ordering::Relaxed)
    }

    /// Every `last_id` sent to the incremental endpoint, in order.
    pub async fn requested_watermarks(&self) -> Vec<i64> {
        self.watermarks.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for MockStore {
    async fn fetch_day_boundaries(&self) -> Result<Vec<DayBoundary>> {
        self.boundary_requests.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail("fetch_day_boundaries").await?;
        Ok(self.boundaries.read().await.clone())
    }

    async fn fetch_day_records(&self, day: DayKey, count: u32) -> Result<Vec<Record>> {
        self.day_requests.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail("fetch_day_records").await?;

        let mut records: Vec<Record> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| day.contains(r.time))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.id);
        if count != ALL_RECORDS {
            let skip = records.len().saturating_sub(count as usize);
            records.drain(..skip);
        }
        Ok(records)
    }

    async fn fetch_incremental(&self, last_id: i64) -> Result<Vec<Record>> {
        self.incremental_requests.fetch_add(1, Ordering::Relaxed);
        self.watermarks.write().await.push(last_id);
        self.check_should_fail("fetch_incremental").await?;

        let mut records: Vec<Record> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.id > last_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }
}

/// Builder for creating mock stores with initial data.
#[derive(Debug, Default)]
pub struct MockStoreBuilder {
    boundaries: Vec<DayBoundary>,
    records: Vec<Record>,
    latency: Duration,
    should_fail: bool,
}

impl MockStoreBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a boundary marker.
    #[must_use]
    pub fn boundary(mut self, boundary: DayBoundary) -> Self {
        self.boundaries.push(boundary);
        self
    }

    /// Add one record.
    #[must_use]
    pub fn record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    /// Add several records.
    #[must_use]
    pub fn records(mut self, records: Vec<Record>) -> Self {
        self.records.extend(records);
        self
    }

    /// Set the response latency.
    #[must_use]
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Start in the failing state.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Build the mock store.
    #[must_use]
    pub fn build(self) -> MockStore {
        let store = MockStore::with_data(self.boundaries, self.records);
        store.should_fail.store(self.should_fail, Ordering::Relaxed);
        store.set_latency(self.latency);
        store
    }
}
