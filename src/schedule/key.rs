use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days in a scheduling week (Monday..Sunday).
pub const DAYS_PER_WEEK: u32 = 7;

/// Resolve a day offset against the week's Monday.
///
/// The caller bounds `offset` to `0..DAYS_PER_WEEK`; `None` only when the
/// date would overflow chrono's range.
pub fn day_from_offset(week_start: NaiveDate, offset: u32) -> Option<NaiveDate> {
    week_start.checked_add_days(Days::new(u64::from(offset)))
}

/// 1-based storage slot of an activity within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot(u32);

impl Slot {
    /// The grid numbers toggles from 0 (`data-index`); storage numbers slots
    /// from 1. This is the only place the two are reconciled.
    pub fn from_ui_index(idx: u32) -> Self {
        Slot(idx.saturating_add(1))
    }

    /// Parse a raw `data-index` attribute. Anything that is not a
    /// non-negative integer is rejected.
    pub fn parse_ui_index(raw: &str) -> Option<Self> {
        raw.trim().parse::<u32>().ok().map(Self::from_ui_index)
    }

    pub fn from_storage(n: u32) -> Self {
        Slot(n)
    }

    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite `tech|day|slot` identity of a schedule row.
///
/// Each part is whitespace-trimmed; comparison is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey(String);

impl RowKey {
    pub fn new(tech: &str, day: &str, slot: &str) -> Self {
        RowKey(format!("{}|{}|{}", tech.trim(), day.trim(), slot.trim()))
    }

    /// Key for an intent resolved against a week start.
    pub fn resolve(tech: &str, day: NaiveDate, slot: Slot) -> Self {
        Self::new(tech, &day.format("%Y-%m-%d").to_string(), &slot.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn offsets_resolve_within_the_week() {
        let monday = d("2025-09-29");
        assert_eq!(day_from_offset(monday, 0), Some(d("2025-09-29")));
        assert_eq!(day_from_offset(monday, 3), Some(d("2025-10-02")));
        assert_eq!(day_from_offset(monday, 6), Some(d("2025-10-05")));
    }

    #[test]
    fn ui_index_is_shifted_once() {
        assert_eq!(Slot::from_ui_index(0).to_string(), "1");
        assert_eq!(Slot::from_ui_index(1).to_string(), "2");
    }

    #[test]
    fn malformed_ui_index_is_rejected() {
        assert_eq!(Slot::parse_ui_index("1"), Some(Slot::from_storage(2)));
        assert_eq!(Slot::parse_ui_index(" 0 "), Some(Slot::from_storage(1)));
        assert_eq!(Slot::parse_ui_index("abc"), None);
        assert_eq!(Slot::parse_ui_index("-1"), None);
        assert_eq!(Slot::parse_ui_index(""), None);
    }

    #[test]
    fn keys_trim_but_keep_case() {
        assert_eq!(
            RowKey::new(" jsmith ", "2025-09-29 ", " 1"),
            RowKey::new("jsmith", "2025-09-29", "1")
        );
        assert_ne!(
            RowKey::new("JSmith", "2025-09-29", "1"),
            RowKey::new("jsmith", "2025-09-29", "1")
        );
    }

    #[test]
    fn resolved_key_matches_stored_literals() {
        let key = RowKey::resolve("jsmith", d("2025-09-30"), Slot::from_ui_index(1));
        assert_eq!(key.as_str(), "jsmith|2025-09-30|2");
    }
}
