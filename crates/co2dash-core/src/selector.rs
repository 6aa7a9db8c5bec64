//! The user's current day choice.

use co2dash_types::DayKey;

use crate::catalog::DayCatalog;
use crate::error::{Error, Result};

/// Holds the chosen day. Changing the choice has no side effects; the
/// session controller reads it only when a session is started.
#[derive(Debug, Clone)]
pub struct DaySelector {
    catalog: DayCatalog,
    selected: Option<DayKey>,
}

impl DaySelector {
    /// Create a selector over `catalog` with nothing chosen yet.
    pub fn new(catalog: DayCatalog) -> Self {
        Self {
            catalog,
            selected: None,
        }
    }

    /// The catalog the choice is drawn from.
    pub fn catalog(&self) -> &DayCatalog {
        &self.catalog
    }

    /// Choose a day. Only catalog entries are accepted.
    pub fn select(&mut self, day: DayKey) -> Result<()> {
        if !self.catalog.contains(day) {
            return Err(Error::UnknownDay(day));
        }
        self.selected = Some(day);
        Ok(())
    }

    /// Parse and choose a day.
    pub fn select_str(&mut self, day: &str) -> Result<()> {
        self.select(day.parse()?)
    }

    /// The explicit choice, if any.
    pub fn selected(&self) -> Option<DayKey> {
        self.selected
    }

    /// The explicit choice, or the newest catalog day the picker shows first.
    pub fn selected_or_newest(&self) -> Result<DayKey> {
        self.selected
            .or_else(|| self.catalog.newest())
            .ok_or(Error::NoDaySelected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_catalog;
    use co2dash_types::{DayBoundary, parse_timestamp};

    fn selector() -> DaySelector {
        let markers = [DayBoundary {
            id: 1,
            time: parse_timestamp("2024-01-01 00:00:00").unwrap(),
        }];
        DaySelector::new(build_catalog(&markers, "2024-01-03".parse().unwrap()))
    }

    #[test]
    fn test_starts_unselected_and_defaults_to_newest() {
        let sel = selector();
        assert_eq!(sel.selected(), None);
        assert_eq!(sel.selected_or_newest().unwrap().to_string(), "2024-01-03");
    }

    #[test]
    fn test_select_known_day() {
        let mut sel = selector();
        sel.select_str("2024-01-02").unwrap();
        assert_eq!(sel.selected().unwrap().to_string(), "2024-01-02");
        assert_eq!(sel.selected_or_newest().unwrap().to_string(), "2024-01-02");
    }

    #[test]
    fn test_select_unknown_day_keeps_previous_choice() {
        let mut sel = selector();
        sel.select_str("2024-01-02").unwrap();
        let err = sel.select_str("2023-12-31").unwrap_err();
        assert!(matches!(err, Error::UnknownDay(_)));
        assert_eq!(sel.selected().unwrap().to_string(), "2024-01-02");
    }

    #[test]
    fn test_select_malformed_day() {
        let mut sel = selector();
        assert!(matches!(sel.select_str("Jan 2"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_empty_catalog_has_no_default() {
        let sel = DaySelector::new(DayCatalog::default());
        assert!(matches!(sel.selected_or_newest(), Err(Error::NoDaySelected)));
    }
}
