//! One CSV blob per week, keyed by its Monday.

use crate::db::log::audit;
use crate::errors::{AppError, AppResult};
use crate::schedule::row::{HEADER_LINE, SchemaVersion};
use crate::utils::date::{is_iso_date, parse_date};
use rusqlite::{Connection, OptionalExtension, params};

fn check_week(week_start: &str) -> AppResult<()> {
    if !is_iso_date(week_start) || parse_date(week_start).is_none() {
        return Err(AppError::InvalidDate(week_start.to_string()));
    }
    Ok(())
}

/// Header-only text stored for a week nobody has saved yet.
pub fn empty_week() -> String {
    format!("{HEADER_LINE}\n")
}

pub fn find_week_csv(conn: &Connection, week_start: &str) -> AppResult<Option<String>> {
    check_week(week_start)?;
    Ok(conn
        .query_row(
            "SELECT csv FROM week_schedules WHERE week_start = ?1",
            [week_start],
            |r| r.get(0),
        )
        .optional()?)
}

/// Return the stored blob, creating the header-only one on first access.
pub fn ensure_week_csv(conn: &Connection, week_start: &str) -> AppResult<String> {
    if let Some(csv) = find_week_csv(conn, week_start)? {
        return Ok(csv);
    }

    let blank = empty_week();
    conn.execute(
        "INSERT INTO week_schedules (week_start, csv) VALUES (?1, ?2)
         ON CONFLICT(week_start) DO NOTHING",
        params![week_start, blank],
    )?;
    Ok(blank)
}

/// Replace the week's blob. The first line must be the V1 header.
pub fn save_week_csv(conn: &Connection, week_start: &str, csv: &str) -> AppResult<()> {
    check_week(week_start)?;
    if csv.trim().is_empty() {
        return Err(AppError::EmptyCsv);
    }

    let first_line = csv.split('\n').next().unwrap_or("");
    if SchemaVersion::detect_line(first_line).is_none() {
        return Err(AppError::HeaderMismatch);
    }

    conn.execute(
        "INSERT INTO week_schedules (week_start, csv) VALUES (?1, ?2)
         ON CONFLICT(week_start) DO UPDATE SET csv = excluded.csv, updated_at = datetime('now')",
        params![week_start, csv],
    )?;

    let lines = csv.lines().filter(|l| !l.trim().is_empty()).count().saturating_sub(1);
    audit(conn, "schedule_save", week_start, &format!("{lines} rows"))?;
    Ok(())
}

/// Stored week keys, newest first.
pub fn list_weeks(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare_cached("SELECT week_start FROM week_schedules ORDER BY week_start DESC")?;
    let rows = stmt.query_map([], |r| r.get(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize::init_db;
    use crate::db::pool::DbPool;

    fn setup() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        pool
    }

    #[test]
    fn first_access_creates_header_only_week() {
        let pool = setup();
        let csv = ensure_week_csv(&pool.conn, "2025-09-29").unwrap();
        assert_eq!(csv, "week_start,tech,day,slot,type,details,notes,status\n");
        assert_eq!(list_weeks(&pool.conn).unwrap(), vec!["2025-09-29"]);
    }

    #[test]
    fn bad_keys_are_rejected() {
        let pool = setup();
        for key in ["2025-9-29", "2025-13-01", "monday"] {
            assert!(matches!(ensure_week_csv(&pool.conn, key), Err(AppError::InvalidDate(_))));
        }
    }

    #[test]
    fn save_validates_then_replaces() {
        let pool = setup();
        let week = "2025-09-29";

        assert!(matches!(save_week_csv(&pool.conn, week, "  \n"), Err(AppError::EmptyCsv)));
        assert!(matches!(
            save_week_csv(&pool.conn, week, "tech,day\namy,2025-09-29\n"),
            Err(AppError::HeaderMismatch)
        ));

        let v1 = "week_start,tech,day,slot,type,details,notes,status\r\n2025-09-29,amy,2025-09-29,1,IMG,,,\r\n";
        save_week_csv(&pool.conn, week, v1).unwrap();
        assert_eq!(ensure_week_csv(&pool.conn, week).unwrap(), v1);

        let v2 = "week_start,tech,day,slot,type,details,notes,status\n";
        save_week_csv(&pool.conn, week, v2).unwrap();
        assert_eq!(find_week_csv(&pool.conn, week).unwrap().as_deref(), Some(v2));
    }
}
