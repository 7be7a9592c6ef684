//! Patch `status` values from intents into a week's CSV text.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

use super::codec::{decode, encode};
use super::intent::StatusIntent;
use super::key::{RowKey, day_from_offset};
use super::row::{COL_DAY, COL_SLOT, COL_STATUS, COL_TECH, COL_WEEK_START, HEADER_FIELDS, SchemaVersion};

/// Why a merge left the text untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unchanged {
    NoIntents,
    HeaderMismatch,
    NoDataRows,
    InvalidWeekStart(String),
    EncodeFailed(String),
}

impl fmt::Display for Unchanged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unchanged::NoIntents => write!(f, "no status intents"),
            Unchanged::HeaderMismatch => write!(f, "header mismatch"),
            Unchanged::NoDataRows => write!(f, "no data rows"),
            Unchanged::InvalidWeekStart(v) => write!(f, "invalid week_start '{v}'"),
            Unchanged::EncodeFailed(e) => write!(f, "encode failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Unchanged(Unchanged),
    Rewritten { matched: usize, dropped: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub text: String,
    pub outcome: MergeOutcome,
}

impl MergeReport {
    fn unchanged(text: &str, reason: Unchanged) -> Self {
        MergeReport {
            text: text.to_string(),
            outcome: MergeOutcome::Unchanged(reason),
        }
    }
}

fn field(record: &[String], idx: usize) -> &str {
    record.get(idx).map(String::as_str).unwrap_or("")
}

const BOM: char = '\u{feff}';

/// Rewrite the `status` column of every row targeted by an intent.
///
/// Never fails: a foreign header, an empty intent list or a week without
/// rows returns the input text as-is. Intents that hit no row are dropped.
/// A leading BOM in the input is written back in front of the output.
pub fn merge(csv_text: &str, intents: &[StatusIntent]) -> MergeReport {
    if intents.is_empty() {
        return MergeReport::unchanged(csv_text, Unchanged::NoIntents);
    }

    let mut records = decode(csv_text);
    if records.first().and_then(|h| SchemaVersion::detect(h)).is_none() {
        return MergeReport::unchanged(csv_text, Unchanged::HeaderMismatch);
    }
    if records.len() < 2 {
        return MergeReport::unchanged(csv_text, Unchanged::NoDataRows);
    }

    let raw_week = field(&records[1], COL_WEEK_START).trim().to_string();
    let Ok(week_start) = NaiveDate::parse_from_str(&raw_week, "%Y-%m-%d") else {
        return MergeReport::unchanged(csv_text, Unchanged::InvalidWeekStart(raw_week));
    };

    // Later duplicates shadow earlier ones.
    let index: HashMap<RowKey, usize> = records
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, rec)| {
            let key = RowKey::new(field(rec, COL_TECH), field(rec, COL_DAY), field(rec, COL_SLOT));
            (key, i)
        })
        .collect();

    let mut matched = 0;
    let mut dropped = 0;

    for intent in intents {
        let Some(day) = day_from_offset(week_start, intent.day_offset) else {
            dropped += 1;
            continue;
        };
        let key = RowKey::resolve(&intent.tech, day, intent.slot);

        match index.get(&key) {
            Some(&i) => {
                let row = &mut records[i];
                if row.len() < HEADER_FIELDS.len() {
                    row.resize(HEADER_FIELDS.len(), String::new());
                }
                row[COL_STATUS] = intent.status.as_str().to_string();
                matched += 1;
            }
            None => dropped += 1,
        }
    }

    match encode(&records) {
        Ok(mut text) => {
            if csv_text.starts_with(BOM) && !text.starts_with(BOM) {
                text.insert(0, BOM);
            }
            MergeReport {
                text,
                outcome: MergeOutcome::Rewritten { matched, dropped },
            }
        }
        Err(e) => MergeReport::unchanged(csv_text, Unchanged::EncodeFailed(e.to_string())),
    }
}

/// [`merge`] without the report.
pub fn apply(csv_text: &str, intents: &[StatusIntent]) -> String {
    merge(csv_text, intents).text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::intent::Status;
    use crate::schedule::key::Slot;

    const WEEK: &str = "week_start,tech,day,slot,type,details,notes,status\r\n\
                        2025-09-29,jsmith,2025-09-29,1,IMG,Laptop #4,,\r\n\
                        2025-09-29,jsmith,2025-09-29,2,CFG,,,\r\n";

    fn intent(tech: &str, day_offset: u32, ui_index: u32, status: Status) -> StatusIntent {
        StatusIntent {
            tech: tech.to_string(),
            day_offset,
            slot: Slot::from_ui_index(ui_index),
            status,
        }
    }

    #[test]
    fn empty_intents_are_a_no_op() {
        let report = merge(WEEK, &[]);
        assert_eq!(report.text, WEEK);
        assert_eq!(report.outcome, MergeOutcome::Unchanged(Unchanged::NoIntents));
    }

    #[test]
    fn foreign_header_is_passed_through() {
        let text = "a,b,c\n1,2,3\n";
        let report = merge(text, &[intent("jsmith", 0, 0, Status::Done)]);
        assert_eq!(report.text, text);
        assert_eq!(report.outcome, MergeOutcome::Unchanged(Unchanged::HeaderMismatch));
    }

    #[test]
    fn header_only_week_is_a_no_op() {
        let text = "week_start,tech,day,slot,type,details,notes,status\n";
        let report = merge(text, &[intent("jsmith", 0, 0, Status::Done)]);
        assert_eq!(report.text, text);
        assert_eq!(report.outcome, MergeOutcome::Unchanged(Unchanged::NoDataRows));
    }

    #[test]
    fn bad_week_start_is_reported() {
        let text = "week_start,tech,day,slot,type,details,notes,status\nsoon,amy,x,1,,,,\n";
        let report = merge(text, &[intent("amy", 0, 0, Status::Done)]);
        assert_eq!(report.text, text);
        assert!(matches!(report.outcome, MergeOutcome::Unchanged(Unchanged::InvalidWeekStart(ref v)) if v == "soon"));
    }

    #[test]
    fn only_status_of_matched_row_changes() {
        let report = merge(WEEK, &[intent("jsmith", 0, 1, Status::Done)]);
        assert_eq!(report.outcome, MergeOutcome::Rewritten { matched: 1, dropped: 0 });

        let before = decode(WEEK);
        let after = decode(&report.text);
        assert_eq!(before.len(), after.len());
        assert_eq!(before[1], after[1]);
        assert_eq!(&before[2][..7], &after[2][..7]);
        assert_eq!(after[2][7], "done");
    }

    #[test]
    fn short_rows_are_padded_before_patching() {
        let text = "week_start,tech,day,slot,type,details,notes,status\n2025-09-29,amy,2025-09-29,1\n";
        let report = merge(text, &[intent("amy", 0, 0, Status::Done)]);
        assert_eq!(
            report.text,
            "week_start,tech,day,slot,type,details,notes,status\r\n2025-09-29,amy,2025-09-29,1,,,,done\r\n"
        );
    }

    #[test]
    fn leading_bom_survives_a_rewrite() {
        let text = format!("\u{feff}{WEEK}");
        let report = merge(&text, &[intent("jsmith", 0, 0, Status::Done)]);
        assert_eq!(report.outcome, MergeOutcome::Rewritten { matched: 1, dropped: 0 });
        assert_eq!(report.text, text.replacen("Laptop #4,,", "Laptop #4,,done", 1));

        let again = apply(&report.text, &[intent("jsmith", 0, 0, Status::Pending)]);
        assert_eq!(again, text);
    }

    #[test]
    fn pending_clears_a_previous_done() {
        let done = apply(WEEK, &[intent("jsmith", 0, 0, Status::Done)]);
        let cleared = apply(&done, &[intent("jsmith", 0, 0, Status::Pending)]);
        assert_eq!(cleared, WEEK);
    }
}
