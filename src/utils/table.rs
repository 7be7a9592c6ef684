//! Table rendering utilities for CLI outputs.

use unicode_width::UnicodeWidthStr;

pub struct Column {
    pub header: String,
    /// Cells wider than this wrap onto extra lines.
    pub width: usize,
}

impl Column {
    pub fn new(header: &str, width: usize) -> Self {
        Self {
            header: header.to_string(),
            width,
        }
    }
}

pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{s}{}", " ".repeat(width.saturating_sub(w)))
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        for col in &self.columns {
            out.push_str(&pad(&col.header, col.width));
            out.push(' ');
        }
        out.push('\n');

        for col in &self.columns {
            out.push_str(&"-".repeat(col.width));
            out.push(' ');
        }
        out.push('\n');

        for row in &self.rows {
            let wrapped: Vec<Vec<String>> = self
                .columns
                .iter()
                .enumerate()
                .map(|(i, col)| {
                    let cell = row.get(i).map(String::as_str).unwrap_or("");
                    if cell.is_empty() {
                        return vec![String::new()];
                    }
                    textwrap::wrap(cell, col.width.max(1))
                        .into_iter()
                        .map(|c| c.into_owned())
                        .collect()
                })
                .collect();

            let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);
            for line in 0..height {
                for (i, col) in self.columns.iter().enumerate() {
                    let part = wrapped[i].get(line).map(String::as_str).unwrap_or("");
                    out.push_str(&pad(part, col.width));
                    out.push(' ');
                }
                out.push('\n');
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_cells_wrap_and_stay_aligned() {
        let mut t = Table::new(vec![Column::new("tech", 6), Column::new("details", 10)]);
        t.add_row(vec!["amy".into(), "reimage three laptops".into()]);
        let out = t.render();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0].trim_end(), "tech   details");
        assert!(lines[2].starts_with("amy    reimage"));
        assert!(lines.len() > 3);
        assert!(lines[3].starts_with("       "));
    }

    #[test]
    fn wide_glyphs_count_by_display_width() {
        assert_eq!(pad("日本", 6), "日本  ");
    }
}
