use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::key::{DAYS_PER_WEEK, Slot, day_from_offset};
use super::row::ScheduleRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "")]
    Pending,
    #[serde(rename = "done")]
    Done,
}

impl Status {
    pub fn from_complete(complete: bool) -> Self {
        if complete { Status::Done } else { Status::Pending }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "",
            Status::Done => "done",
        }
    }
}

/// One "Complete" toggle resolved to a target row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusIntent {
    pub tech: String,
    pub day_offset: u32,
    pub slot: Slot,
    pub status: Status,
}

/// Grid UI state: one row per tech, one cell per day offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridState {
    #[serde(default)]
    pub rows: Vec<GridRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRow {
    pub tech: String,
    #[serde(default)]
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    #[serde(default)]
    pub entries: Vec<CellEntry>,
}

/// An activity block inside a cell together with its toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellEntry {
    /// Raw `data-index` of the toggle (0-based).
    #[serde(default)]
    pub index: String,
    #[serde(rename = "type", default)]
    pub type_code: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub complete: bool,
    /// Value of the paired hidden status input, if one was paired.
    #[serde(default)]
    pub status_field: Option<String>,
}

impl GridCell {
    /// Notes are shared by both slots of a day; the first non-empty wins.
    pub fn notes(&self) -> &str {
        self.entries
            .iter()
            .map(|e| e.notes.trim())
            .find(|n| !n.is_empty())
            .unwrap_or("")
    }
}

/// Walk the grid in document order and emit one intent per usable toggle.
pub fn collect(ui: &GridState) -> Vec<StatusIntent> {
    let mut out = Vec::new();

    for row in &ui.rows {
        let tech = row.tech.trim();
        if tech.is_empty() {
            continue;
        }

        for (offset, cell) in row.cells.iter().take(DAYS_PER_WEEK as usize).enumerate() {
            for entry in &cell.entries {
                if entry.status_field.is_none() {
                    continue;
                }
                let Some(slot) = Slot::parse_ui_index(&entry.index) else {
                    continue;
                };
                out.push(StatusIntent {
                    tech: tech.to_string(),
                    day_offset: offset as u32,
                    slot,
                    status: Status::from_complete(entry.complete),
                });
            }
        }
    }

    out
}

/// Rebuild schedule rows from the grid, two slots per (tech, day) with the
/// day's notes duplicated on both. Status starts empty; the merge pass fills
/// it in from the toggles.
pub fn gather_rows(ui: &GridState, week_start: NaiveDate) -> Vec<ScheduleRow> {
    let week = week_start.format("%Y-%m-%d").to_string();
    let mut out = Vec::new();

    for row in &ui.rows {
        let tech = row.tech.trim();
        if tech.is_empty() {
            continue;
        }

        for (offset, cell) in row.cells.iter().take(DAYS_PER_WEEK as usize).enumerate() {
            let Some(day) = day_from_offset(week_start, offset as u32) else {
                continue;
            };
            let day = day.format("%Y-%m-%d").to_string();
            let notes = cell.notes().to_string();

            for slot in 1..=2u32 {
                let entry = cell.entries.get(slot as usize - 1);
                out.push(ScheduleRow {
                    week_start: week.clone(),
                    tech: tech.to_string(),
                    day: day.clone(),
                    slot,
                    type_code: entry.map(|e| e.type_code.trim().to_string()).unwrap_or_default(),
                    details: entry.map(|e| e.details.trim().to_string()).unwrap_or_default(),
                    notes: notes.clone(),
                    status: String::new(),
                });
            }
        }
    }

    out
}
