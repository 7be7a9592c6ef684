use serde::Serialize;
use std::collections::HashMap;

/// Column names of a V1 blob, in storage order.
pub const HEADER_FIELDS: [&str; 8] = [
    "week_start",
    "tech",
    "day",
    "slot",
    "type",
    "details",
    "notes",
    "status",
];

/// The exact first line of every stored week.
pub const HEADER_LINE: &str = "week_start,tech,day,slot,type,details,notes,status";

pub const COL_WEEK_START: usize = 0;
pub const COL_TECH: usize = 1;
pub const COL_DAY: usize = 2;
pub const COL_SLOT: usize = 3;
pub const COL_STATUS: usize = 7;

const BOM: char = '\u{feff}';

/// Storage format version, declared by the header literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    V1,
}

impl SchemaVersion {
    /// Recognise a decoded header record. Each field is trimmed (and the
    /// first one loses a leading BOM) before the column-for-column compare.
    pub fn detect(header: &[String]) -> Option<Self> {
        if header.len() != HEADER_FIELDS.len() {
            return None;
        }

        let matches = header.iter().enumerate().all(|(i, field)| {
            let field = if i == 0 {
                field.trim_start_matches(BOM)
            } else {
                field.as_str()
            };
            field.trim() == HEADER_FIELDS[i]
        });

        matches.then_some(SchemaVersion::V1)
    }

    /// Same check on a raw first line, the way the store validates uploads.
    pub fn detect_line(line: &str) -> Option<Self> {
        let line = line.trim_start_matches(BOM).trim();
        (line == HEADER_LINE).then_some(SchemaVersion::V1)
    }
}

/// A normalized schedule line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub week_start: String,
    pub tech: String,
    pub day: String,
    /// 0 when the stored value is not an integer.
    pub slot: u32,
    #[serde(rename = "type")]
    pub type_code: String,
    pub details: String,
    pub notes: String,
    pub status: String,
}

fn clean(raw: Option<&String>) -> String {
    raw.map(|s| {
        s.trim_start_matches(BOM)
            .replace(['\r', '\n'], "")
            .trim()
            .to_string()
    })
    .unwrap_or_default()
}

/// Column positions resolved from a header, case-insensitively.
#[derive(Debug, Clone, Copy)]
pub struct ColumnIndex([usize; 8]);

impl ColumnIndex {
    pub fn from_header(header: &[String]) -> Option<Self> {
        let by_name: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim_start_matches(BOM).trim().to_lowercase(), i))
            .collect();

        let mut cols = [0usize; 8];
        for (slot, name) in cols.iter_mut().zip(HEADER_FIELDS) {
            *slot = *by_name.get(name)?;
        }
        Some(ColumnIndex(cols))
    }
}

impl ScheduleRow {
    pub fn from_record(record: &[String], cols: &ColumnIndex) -> Self {
        let get = |i: usize| clean(record.get(cols.0[i]));
        ScheduleRow {
            week_start: get(0),
            tech: get(1),
            day: get(2),
            slot: get(3).parse().unwrap_or(0),
            type_code: get(4),
            details: get(5),
            notes: get(6),
            status: get(7),
        }
    }

    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.week_start.clone(),
            self.tech.clone(),
            self.day.clone(),
            self.slot.to_string(),
            self.type_code.clone(),
            self.details.clone(),
            self.notes.clone(),
            self.status.clone(),
        ]
    }

    pub fn is_done(&self) -> bool {
        self.status.eq_ignore_ascii_case("done")
    }
}

/// Turn decoded records (header first) into typed rows. A header missing any
/// of the eight names yields no rows. Rows with an empty tech are kept.
pub fn normalize(records: &[Vec<String>]) -> Vec<ScheduleRow> {
    let Some((header, body)) = records.split_first() else {
        return Vec::new();
    };
    let Some(cols) = ColumnIndex::from_header(header) else {
        return Vec::new();
    };

    body.iter()
        .map(|rec| ScheduleRow::from_record(rec, &cols))
        .collect()
}

/// Header record in storage order.
pub fn header_record() -> Vec<String> {
    HEADER_FIELDS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::codec::decode;

    #[test]
    fn header_literal_matches_fields() {
        assert_eq!(HEADER_FIELDS.join(","), HEADER_LINE);
    }

    #[test]
    fn detect_trims_fields_and_bom() {
        let rec: Vec<String> = format!("\u{feff}{}", HEADER_LINE.replace(',', " , "))
            .split(',')
            .map(str::to_string)
            .collect();
        assert_eq!(SchemaVersion::detect(&rec), Some(SchemaVersion::V1));
    }

    #[test]
    fn detect_rejects_reordered_or_short_headers() {
        let reordered = decode("tech,week_start,day,slot,type,details,notes,status");
        assert_eq!(SchemaVersion::detect(&reordered[0]), None);

        let short = decode("week_start,tech,day,slot,type,details,notes");
        assert_eq!(SchemaVersion::detect(&short[0]), None);

        let upper = decode("WEEK_START,tech,day,slot,type,details,notes,status");
        assert_eq!(SchemaVersion::detect(&upper[0]), None);
    }

    #[test]
    fn detect_line_matches_store_rules() {
        assert!(SchemaVersion::detect_line(" week_start,tech,day,slot,type,details,notes,status\r").is_some());
        assert!(SchemaVersion::detect_line("week_start,tech").is_none());
    }

    #[test]
    fn normalizer_accepts_any_column_order_and_case() {
        let recs = decode(
            "Tech,Week_Start,Day,Slot,Type,Details,Notes,Status\n\
             \" jsmith \",2025-09-29,2025-09-29,x,IMG,\"Laptop\r\n#4\",,done\n",
        );
        let rows = normalize(&recs);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tech, "jsmith");
        assert_eq!(rows[0].week_start, "2025-09-29");
        assert_eq!(rows[0].slot, 0);
        assert_eq!(rows[0].details, "Laptop#4");
        assert!(rows[0].is_done());
    }

    #[test]
    fn normalizer_keeps_rows_without_tech() {
        let recs = decode(&format!(
            "{HEADER_LINE}\n2025-10-06,,2025-10-06,1,IMG,,,\n2025-09-29,amy,2025-09-29,1,CFG,,,\n"
        ));
        let rows = normalize(&recs);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tech, "");
        assert_eq!(rows[0].week_start, "2025-10-06");
        assert_eq!(rows[1].tech, "amy");
    }

    #[test]
    fn normalizer_needs_every_column() {
        let recs = decode("week_start,tech,day,slot\n2025-09-29,amy,2025-09-29,1\n");
        assert!(normalize(&recs).is_empty());
    }

    #[test]
    fn to_record_keeps_header_order() {
        let row = ScheduleRow {
            week_start: "2025-09-29".into(),
            tech: "amy".into(),
            day: "2025-09-30".into(),
            slot: 2,
            type_code: "OnB".into(),
            details: "new hire".into(),
            notes: "n".into(),
            status: "".into(),
        };
        assert_eq!(
            row.to_record(),
            vec!["2025-09-29", "amy", "2025-09-30", "2", "OnB", "new hire", "n", ""]
        );
    }
}
