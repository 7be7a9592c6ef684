use crate::db::log::{LogEntry, load_entries};
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use ansi_term::Colour;
use unicode_width::UnicodeWidthStr;

const OP_WIDTH_MAX: usize = 60;

fn color_for_operation(op: &str) -> Colour {
    match op {
        "user_add" => Colour::Green,
        "user_passwd" => Colour::Yellow,
        "schedule_save" => Colour::Cyan,
        "schedule_import" => Colour::Blue,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

fn label(e: &LogEntry) -> String {
    if e.target.is_empty() {
        e.operation.clone()
    } else {
        format!("{} ({})", e.operation, e.target)
    }
}

/// Cut to `max` columns, marking the cut with "...".
fn truncate(s: &str, max: usize) -> String {
    if UnicodeWidthStr::width(s) <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn display_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%FT%T%:z").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub struct LogLogic;

impl LogLogic {
    /// One line per entry, the operation word coloured.
    pub fn format_entries(entries: &[LogEntry]) -> Vec<String> {
        let labels: Vec<String> = entries.iter().map(|e| truncate(&label(e), OP_WIDTH_MAX)).collect();
        let dates: Vec<String> = entries.iter().map(|e| display_date(&e.date)).collect();

        let op_w = labels.iter().map(|l| UnicodeWidthStr::width(l.as_str())).max().unwrap_or(0);
        let id_w = entries.iter().map(|e| e.id.to_string().len()).max().unwrap_or(1);
        let date_w = dates.iter().map(String::len).max().unwrap_or(0);

        entries
            .iter()
            .zip(labels.iter().zip(dates.iter()))
            .map(|(e, (label, date))| {
                let colour = color_for_operation(&e.operation);
                let coloured = match label.split_once(' ') {
                    Some((op, rest)) => format!("{} {}", colour.paint(op), rest),
                    None => colour.paint(label.as_str()).to_string(),
                };
                let padding = " ".repeat(op_w.saturating_sub(UnicodeWidthStr::width(label.as_str())));
                format!(
                    "{:>id_w$}: {:<date_w$} | {}{} => {}",
                    e.id, date, coloured, padding, e.message
                )
            })
            .collect()
    }

    pub fn print_log(pool: &mut DbPool) -> AppResult<()> {
        let entries = load_entries(&pool.conn)?;
        println!("📜 Internal log:\n");
        for line in Self::format_entries(&entries) {
            println!("{line}");
        }
        Ok(())
    }
}
