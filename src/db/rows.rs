//! Wide tables are returned to the API as JSON objects keyed by column name.

use rusqlite::types::{ToSql, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::{Map, Number, Value};

/// Integer flag columns exposed as booleans.
const BOOL_COLUMNS: &[&str] = &[
    "active",
    "is_active",
    "onsite_scheduled",
    "certificate_issued",
    "is_past_hold",
];

pub fn row_to_json(row: &Row) -> rusqlite::Result<Value> {
    let stmt = row.as_ref();
    let mut obj = Map::new();

    for i in 0..stmt.column_count() {
        let name = stmt.column_name(i)?.to_string();
        let value = match row.get_ref(i)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(n) if BOOL_COLUMNS.contains(&name.as_str()) => Value::Bool(n != 0),
            ValueRef::Integer(n) => Value::from(n),
            ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
        };
        obj.insert(name, value);
    }

    Ok(Value::Object(obj))
}

pub fn query_json(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<Vec<Value>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, row_to_json)?;
    rows.collect()
}

pub fn query_one_json(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<Option<Value>> {
    conn.query_row(sql, params, row_to_json).optional()
}

/// Build `?, ?, ?` for an `IN (...)` clause.
pub fn placeholders(n: usize) -> String {
    std::iter::repeat_n("?", n).collect::<Vec<_>>().join(", ")
}

/// Dynamic `AND ...` filters collected alongside their bound values.
#[derive(Debug, Default)]
pub struct Filters {
    clauses: Vec<String>,
    values: Vec<String>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// `clause` uses `?` for the single bound value.
    pub fn push(&mut self, clause: &str, value: impl Into<String>) {
        self.clauses.push(clause.to_string());
        self.values.push(value.into());
    }

    /// A clause without a bound value.
    pub fn push_raw(&mut self, clause: &str) {
        self.clauses.push(clause.to_string());
    }

    /// `WHERE 1=1 AND ...`
    pub fn where_sql(&self) -> String {
        let mut sql = String::from("WHERE 1=1");
        for c in &self.clauses {
            sql.push_str(" AND ");
            sql.push_str(c);
        }
        sql
    }

    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.values.iter().map(|v| v as &dyn ToSql).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_and_flags_are_typed() {
        let conn = Connection::open_in_memory().unwrap();
        let rows = query_json(
            &conn,
            "SELECT 1 AS id, 'x' AS name, NULL AS missing, 1 AS active, 2.5 AS ratio",
            &[],
        )
        .unwrap();
        assert_eq!(
            rows[0],
            serde_json::json!({"id": 1, "name": "x", "missing": null, "active": true, "ratio": 2.5})
        );
    }

    #[test]
    fn filters_render_in_push_order() {
        let mut f = Filters::new();
        f.push("status = ?", "open");
        f.push_raw("hold_until_date < date('now')");
        f.push("client_id LIKE ?", "%acme%");
        assert_eq!(
            f.where_sql(),
            "WHERE 1=1 AND status = ? AND hold_until_date < date('now') AND client_id LIKE ?"
        );
        assert_eq!(f.params().len(), 2);
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
