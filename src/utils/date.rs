use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn today_iso() -> String {
    today().format("%Y-%m-%d").to_string()
}

/// Literal `YYYY-MM-DD` shape (what the week store accepts as a key).
pub fn is_iso_date(s: &str) -> bool {
    ISO_DATE.is_match(s)
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Monday on or before `d`.
pub fn monday_of(d: NaiveDate) -> NaiveDate {
    let back = u64::from(d.weekday().num_days_from_monday());
    d.checked_sub_days(Days::new(back)).unwrap_or(d)
}

/// Resolve a `--week` argument: an ISO date (any day of the week) or
/// `current`.
pub fn resolve_week(arg: &str) -> Option<NaiveDate> {
    if arg.eq_ignore_ascii_case("current") {
        return Some(monday_of(today()));
    }
    parse_date(arg).map(monday_of)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn iso_shape_only() {
        assert!(is_iso_date("2025-09-29"));
        assert!(!is_iso_date("2025-9-29"));
        assert!(!is_iso_date("2025-09-29T00:00"));
        assert!(!is_iso_date(" 2025-09-29"));
    }

    #[test]
    fn monday_of_snaps_back() {
        assert_eq!(monday_of(d("2025-09-29")), d("2025-09-29"));
        assert_eq!(monday_of(d("2025-10-02")), d("2025-09-29"));
        assert_eq!(monday_of(d("2025-10-05")), d("2025-09-29"));
    }

    #[test]
    fn resolve_week_accepts_any_weekday() {
        assert_eq!(resolve_week("2025-10-01"), Some(d("2025-09-29")));
        assert_eq!(resolve_week("soon"), None);
        assert!(resolve_week("current").is_some());
    }
}
