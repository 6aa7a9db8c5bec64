//! Day catalog construction.
//!
//! The store reports sparse markers, one per contiguous range of data. The
//! picker needs a continuous list, so each marker is expanded into every
//! calendar day from its date through today, the expansions are concatenated
//! in marker order and the result is reversed to put the newest day first.
//!
//! Overlapping ranges are kept as-is: if two markers cover the same day,
//! that day appears twice.

use tracing::debug;

use co2dash_types::{DayBoundary, DayKey};

use crate::clock::Clock;
use crate::error::Result;
use crate::store::RecordStore;

/// Newest-first list of selectable days. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayCatalog {
    days: Vec<DayKey>,
}

/// Expand boundary markers into a gap-free, newest-first day list.
///
/// Markers dated after `today` contribute nothing.
///
/// # Example
///
/// ```
/// use co2dash_core::catalog::build_catalog;
/// use co2dash_types::{DayBoundary, parse_timestamp};
///
/// let markers = [DayBoundary { id: 1, time: parse_timestamp("2024-01-01 00:00:00").unwrap() }];
/// let catalog = build_catalog(&markers, "2024-01-03".parse().unwrap());
///
/// let days: Vec<String> = catalog.days().iter().map(|d| d.to_string()).collect();
/// assert_eq!(days, ["2024-01-03", "2024-01-02", "2024-01-01"]);
/// ```
pub fn build_catalog(boundaries: &[DayBoundary], today: DayKey) -> DayCatalog {
    let mut days = Vec::new();

    for marker in boundaries {
        let mut day = Some(marker.day());
        while let Some(current) = day.filter(|d| *d <= today) {
            days.push(current);
            day = current.next();
        }
    }

    days.reverse();
    DayCatalog { days }
}

impl DayCatalog {
    /// Fetch the markers from `store` and build the catalog for today.
    pub async fn fetch<S: RecordStore + ?Sized>(store: &S, clock: &dyn Clock) -> Result<Self> {
        let boundaries = store.fetch_day_boundaries().await?;
        let catalog = build_catalog(&boundaries, clock.today());
        debug!(
            "Built day catalog: {} marker(s) -> {} day(s)",
            boundaries.len(),
            catalog.len()
        );
        Ok(catalog)
    }

    /// The days, newest first.
    pub fn days(&self) -> &[DayKey] {
        &self.days
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether no day is selectable.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Whether `day` can be selected.
    pub fn contains(&self, day: DayKey) -> bool {
        self.days.contains(&day)
    }

    /// The first entry, which is the default picker option.
    pub fn newest(&self) -> Option<DayKey> {
        self.days.first().copied()
    }
}
