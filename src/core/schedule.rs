use crate::client::{HttpTransport, SaveAck, SaveClient, StatusPersist};
use crate::db::log::audit;
use crate::db::schedule::{empty_week, find_week_csv, list_weeks, save_week_csv};
use crate::errors::{AppError, AppResult};
use crate::schedule::codec::{decode, encode};
use crate::schedule::intent::{GridState, collect, gather_rows};
use crate::schedule::key::{DAYS_PER_WEEK, day_from_offset};
use crate::schedule::merge::{MergeOutcome, MergeReport, merge};
use crate::schedule::row::{ScheduleRow, SchemaVersion, header_record, normalize};
use crate::ui::messages::{header, info, success, warning};
use crate::utils::colors::{GREEN, GREY, RESET};
use crate::utils::table::{Column, Table};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

fn iso(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub fn read_grid(path: &Path) -> AppResult<GridState> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Every data row, with or without a tech, must belong to `week`: same
/// `week_start`, `day` inside the seven days. Returns the number of rows.
pub fn check_rows(csv: &str, week: NaiveDate) -> AppResult<usize> {
    let week_start = iso(week);
    let first = iso(week);
    let last = day_from_offset(week, DAYS_PER_WEEK - 1).map(iso).unwrap_or_else(|| first.clone());

    let records = decode(csv);
    let Some(head) = records.first() else {
        return Err(AppError::EmptyCsv);
    };
    if SchemaVersion::detect(head).is_none() {
        return Err(AppError::HeaderMismatch);
    }

    let rows = normalize(&records);
    for row in &rows {
        if row.week_start != week_start {
            return Err(AppError::WeekMismatch {
                expected: week_start,
                found: row.week_start.clone(),
            });
        }
        // ISO dates order lexically
        if row.day < first || row.day > last {
            return Err(AppError::DayOutsideWeek {
                day: row.day.clone(),
                week_start,
            });
        }
    }
    Ok(rows.len())
}

fn render_rows(rows: &[ScheduleRow]) -> String {
    let mut table = Table::new(vec![
        Column::new("Tech", 12),
        Column::new("Day", 10),
        Column::new("Slot", 4),
        Column::new("Type", 5),
        Column::new("Details", 28),
        Column::new("Notes", 20),
        Column::new("Status", 6),
    ]);
    for r in rows {
        table.add_row(vec![
            r.tech.clone(),
            r.day.clone(),
            r.slot.to_string(),
            r.type_code.clone(),
            r.details.clone(),
            r.notes.clone(),
            r.status.clone(),
        ]);
    }
    table.render()
}

fn report_outcome(report: &MergeReport) {
    match &report.outcome {
        MergeOutcome::Rewritten { matched, dropped } => {
            success(format!("{matched} status value(s) merged, {dropped} intent(s) matched no row"))
        }
        MergeOutcome::Unchanged(reason) => warning(format!("CSV left unchanged: {reason}")),
    }
}

pub struct ScheduleLogic;

impl ScheduleLogic {
    pub fn show(conn: &Connection, week: NaiveDate) -> AppResult<()> {
        let key = iso(week);
        header(format!("Week of {key}"));

        let Some(csv) = find_week_csv(conn, &key)? else {
            println!("{GREY}No schedule stored for this week.{RESET}");
            return Ok(());
        };

        let rows: Vec<ScheduleRow> = normalize(&decode(&csv))
            .into_iter()
            .filter(|r| !r.tech.is_empty())
            .collect();
        if rows.is_empty() {
            println!("{GREY}No rows.{RESET}");
            return Ok(());
        }

        print!("{}", render_rows(&rows));
        let done = rows.iter().filter(|r| r.is_done()).count();
        println!("\n{GREEN}{done}{RESET} of {} slot(s) done", rows.len());
        Ok(())
    }

    pub fn import(conn: &Connection, week: NaiveDate, file: &Path) -> AppResult<usize> {
        let key = iso(week);
        let csv = fs::read_to_string(file)?;
        let rows = check_rows(&csv, week)?;

        save_week_csv(conn, &key, &csv)?;
        audit(conn, "schedule_import", &key, &file.display().to_string())?;
        success(format!("Imported {rows} row(s) into week {key}"));
        Ok(rows)
    }

    /// Write the stored blob, or the header-only one for an unknown week.
    pub fn export(conn: &Connection, week: NaiveDate, file: &Path, force: bool) -> AppResult<()> {
        if file.exists() && !force {
            return Err(AppError::FileExists(file.display().to_string()));
        }
        let key = iso(week);
        let csv = find_week_csv(conn, &key)?.unwrap_or_else(empty_week);
        fs::write(file, csv)?;
        success(format!("Week {key} exported to {}", file.display()));
        Ok(())
    }

    /// Offline merge of a grid file into a CSV file.
    pub fn apply(csv_file: &Path, grid_file: &Path, out: Option<&Path>) -> AppResult<MergeReport> {
        let csv = fs::read_to_string(csv_file)?;
        let grid = read_grid(grid_file)?;
        let report = merge(&csv, &collect(&grid));

        match out {
            Some(path) => {
                fs::write(path, &report.text)?;
                report_outcome(&report);
                info(format!("Written to {}", path.display()));
            }
            None => print!("{}", report.text),
        }
        Ok(report)
    }

    /// Lay out a fresh week from a grid file: two rows per (tech, day), the
    /// status column filled from the grid's toggles.
    pub fn build(grid_file: &Path, week: NaiveDate, out: &Path, force: bool) -> AppResult<usize> {
        if out.exists() && !force {
            return Err(AppError::FileExists(out.display().to_string()));
        }
        let grid = read_grid(grid_file)?;
        let rows = gather_rows(&grid, week);

        let blank = encode(std::iter::once(header_record()).chain(rows.iter().map(ScheduleRow::to_record)))?;
        let report = merge(&blank, &collect(&grid));
        fs::write(out, &report.text)?;

        let done = match report.outcome {
            MergeOutcome::Rewritten { matched, .. } => matched,
            MergeOutcome::Unchanged(_) => 0,
        };
        success(format!("Built week {} with {} row(s) into {}", iso(week), rows.len(), out.display()));
        info(format!("{done} status value(s) taken from the grid"));
        Ok(rows.len())
    }

    /// Post a week to a running server through the status-persisting client.
    pub fn push(
        server: &str,
        week: NaiveDate,
        file: &Path,
        grid_file: Option<&Path>,
        json_wrap: bool,
    ) -> AppResult<SaveAck> {
        let csv = fs::read_to_string(file)?;
        let grid = match grid_file {
            Some(p) => read_grid(p)?,
            None => GridState::default(),
        };

        let client = SaveClient::new(HttpTransport::new(server)?)
            .with_interceptor(StatusPersist::new(move || grid.clone()).verbose(true));
        let ack = client.save_week(week, csv, json_wrap)?;

        if ack.ok {
            success(format!("Saved week {} -> {}", iso(week), ack.file.as_deref().unwrap_or("?")));
        } else {
            warning(format!(
                "Server did not accept the save: {}",
                ack.error.as_deref().unwrap_or("unknown error")
            ));
        }
        Ok(ack)
    }

    pub fn weeks(conn: &Connection) -> AppResult<Vec<String>> {
        let weeks = list_weeks(conn)?;
        if weeks.is_empty() {
            println!("{GREY}No weeks stored.{RESET}");
        }
        for w in &weeks {
            println!("{w}");
        }
        Ok(weeks)
    }
}
