use crate::db::pool::DbPool;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use rusqlite::OptionalExtension;
use std::fs;

const COUNTED_TABLES: &[(&str, &str)] = &[
    ("users", "Users"),
    ("week_schedules", "Stored weeks"),
    ("projects", "Projects"),
    ("equipment_checkin", "Equipment check-ins"),
    ("hard_drives", "Hard drives"),
    ("hard_drive_destruction", "Destruction records"),
];

pub fn print_db_info(pool: &mut DbPool, db_path: &str) -> rusqlite::Result<()> {
    println!();

    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    for (table, label) in COUNTED_TABLES {
        let count: i64 = pool
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        println!("{}• {}:{} {}{}{}", CYAN, label, RESET, GREEN, count, RESET);
    }

    let first_week: Option<String> = pool
        .conn
        .query_row("SELECT MIN(week_start) FROM week_schedules", [], |row| row.get(0))
        .optional()?
        .flatten();
    let last_week: Option<String> = pool
        .conn
        .query_row("SELECT MAX(week_start) FROM week_schedules", [], |row| row.get(0))
        .optional()?
        .flatten();

    let fmt_first = first_week.unwrap_or_else(|| format!("{GREY}--{RESET}"));
    let fmt_last = last_week.unwrap_or_else(|| format!("{GREY}--{RESET}"));

    println!("{}• Week range:{}", CYAN, RESET);
    println!("    from: {}", fmt_first);
    println!("    to:   {}", fmt_last);

    println!();
    Ok(())
}
