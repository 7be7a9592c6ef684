//! Hard drive destruction certificates.

use crate::db::rows::{Filters, query_json, query_one_json};
use crate::errors::{AppError, AppResult};
use crate::utils::date::today_iso;
use rusqlite::{Connection, params};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DestructionInput {
    pub destruction_date: Option<String>,
    pub client_name: Option<String>,
    pub client_id: Option<String>,
    pub drive_serial_number: Option<String>,
    pub drive_manufacturer: Option<String>,
    pub drive_model: Option<String>,
    pub drive_capacity: Option<String>,
    pub drive_type: Option<String>,
    pub destruction_method: Option<String>,
    pub destroyed_by: Option<String>,
    pub witness: Option<String>,
    pub certificate_number: Option<String>,
    pub asset_tag: Option<String>,
    pub original_location: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub special_requirements: Option<String>,
    pub compliance_standard: Option<String>,
    pub batch_number: Option<String>,
    pub certificate_issued: Option<bool>,
    pub certificate_issued_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DestructionFilter {
    pub status: Option<String>,
    pub client_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub destroyed_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRange {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn set(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

pub fn list_records(conn: &Connection, filter: &DestructionFilter) -> AppResult<Vec<Value>> {
    let mut f = Filters::new();
    if let Some(s) = set(&filter.status) {
        f.push("status = ?", s);
    }
    if let Some(c) = set(&filter.client_name) {
        f.push("client_name LIKE ?", format!("%{c}%"));
    }
    if let Some(d) = set(&filter.start_date) {
        f.push("destruction_date >= ?", d);
    }
    if let Some(d) = set(&filter.end_date) {
        f.push("destruction_date <= ?", d);
    }
    if let Some(b) = set(&filter.destroyed_by) {
        f.push("destroyed_by = ?", b);
    }

    let sql = format!(
        "SELECT * FROM hard_drive_destruction {} ORDER BY destruction_date DESC, id DESC",
        f.where_sql()
    );
    Ok(query_json(conn, &sql, &f.params())?)
}

pub fn get_record(conn: &Connection, id: i64) -> AppResult<Option<Value>> {
    Ok(query_one_json(conn, "SELECT * FROM hard_drive_destruction WHERE id = ?1", &[&id])?)
}

/// Date defaults to today and status to `completed`.
pub fn create_record(conn: &Connection, input: &DestructionInput, created_by: &str) -> AppResult<Value> {
    let date = set(&input.destruction_date).map(str::to_string).unwrap_or_else(today_iso);

    conn.execute(
        "INSERT INTO hard_drive_destruction (
            destruction_date, client_name, client_id,
            drive_serial_number, drive_manufacturer, drive_model,
            drive_capacity, drive_type, destruction_method,
            destroyed_by, witness, certificate_number,
            asset_tag, original_location, department,
            status, notes, special_requirements,
            compliance_standard, batch_number,
            certificate_issued, certificate_issued_date,
            created_by
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
            ?19, ?20, ?21, ?22, ?23
        )",
        params![
            date,
            input.client_name,
            input.client_id,
            input.drive_serial_number,
            input.drive_manufacturer,
            input.drive_model,
            input.drive_capacity,
            input.drive_type,
            input.destruction_method,
            input.destroyed_by,
            input.witness,
            input.certificate_number,
            input.asset_tag,
            input.original_location,
            input.department,
            set(&input.status).unwrap_or("completed"),
            input.notes,
            input.special_requirements,
            input.compliance_standard,
            input.batch_number,
            input.certificate_issued.unwrap_or(false),
            input.certificate_issued_date,
            created_by,
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_record(conn, id)?.ok_or_else(|| AppError::Other(format!("destruction record {id} missing after insert")))
}

/// Full replacement of the editable fields; `None` when the id is unknown.
pub fn update_record(
    conn: &Connection,
    id: i64,
    input: &DestructionInput,
    updated_by: &str,
) -> AppResult<Option<Value>> {
    let changed = conn.execute(
        "UPDATE hard_drive_destruction SET
            destruction_date        = COALESCE(?1, destruction_date),
            client_name             = ?2,
            client_id               = ?3,
            drive_serial_number     = ?4,
            drive_manufacturer      = ?5,
            drive_model             = ?6,
            drive_capacity          = ?7,
            drive_type              = ?8,
            destruction_method      = ?9,
            destroyed_by            = ?10,
            witness                 = ?11,
            certificate_number      = ?12,
            asset_tag               = ?13,
            original_location       = ?14,
            department              = ?15,
            status                  = COALESCE(?16, status),
            notes                   = ?17,
            special_requirements    = ?18,
            compliance_standard     = ?19,
            batch_number            = ?20,
            certificate_issued      = COALESCE(?21, certificate_issued),
            certificate_issued_date = ?22,
            updated_by              = ?23,
            updated_at              = datetime('now')
         WHERE id = ?24",
        params![
            set(&input.destruction_date),
            input.client_name,
            input.client_id,
            input.drive_serial_number,
            input.drive_manufacturer,
            input.drive_model,
            input.drive_capacity,
            input.drive_type,
            input.destruction_method,
            input.destroyed_by,
            input.witness,
            input.certificate_number,
            input.asset_tag,
            input.original_location,
            input.department,
            set(&input.status),
            input.notes,
            input.special_requirements,
            input.compliance_standard,
            input.batch_number,
            input.certificate_issued,
            input.certificate_issued_date,
            updated_by,
            id,
        ],
    )?;

    if changed == 0 {
        return Ok(None);
    }
    get_record(conn, id)
}

/// Returns the deleted row.
pub fn delete_record(conn: &Connection, id: i64) -> AppResult<Option<Value>> {
    let Some(row) = get_record(conn, id)? else {
        return Ok(None);
    };
    conn.execute("DELETE FROM hard_drive_destruction WHERE id = ?1", [id])?;
    Ok(Some(row))
}

pub fn stats_summary(conn: &Connection, range: &DateRange) -> AppResult<Value> {
    let mut f = Filters::new();
    if let Some(d) = set(&range.start_date) {
        f.push("destruction_date >= ?", d);
    }
    if let Some(d) = set(&range.end_date) {
        f.push("destruction_date <= ?", d);
    }

    let sql = format!(
        "SELECT
            COUNT(*) AS total_destroyed,
            COUNT(DISTINCT client_name) AS total_clients,
            COUNT(DISTINCT batch_number) AS total_batches,
            IFNULL(SUM(CASE WHEN certificate_issued THEN 1 ELSE 0 END), 0) AS certificates_issued,
            COUNT(DISTINCT destroyed_by) AS techs_involved
         FROM hard_drive_destruction
         {}",
        f.where_sql()
    );
    Ok(query_one_json(conn, &sql, &f.params())?.unwrap_or_else(|| json!({})))
}

pub fn stats_by_tech(conn: &Connection) -> AppResult<Vec<Value>> {
    Ok(query_json(
        conn,
        "SELECT destroyed_by,
                COUNT(*) AS count,
                MIN(destruction_date) AS first_destruction,
                MAX(destruction_date) AS last_destruction
         FROM hard_drive_destruction
         WHERE destroyed_by IS NOT NULL
         GROUP BY destroyed_by
         ORDER BY count DESC",
        &[],
    )?)
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

    fn record(date: &str, client: &str, by: &str, cert: bool) -> DestructionInput {
        DestructionInput {
            destruction_date: Some(date.into()),
            client_name: Some(client.into()),
            destroyed_by: Some(by.into()),
            batch_number: Some(format!("B-{date}")),
            certificate_issued: Some(cert),
            ..Default::default()
        }
    }

    #[test]
    fn create_applies_defaults_and_author() {
        let pool = setup();
        let row = create_record(&pool.conn, &DestructionInput::default(), "dev-admin").unwrap();
        assert_eq!(row["status"], "completed");
        assert_eq!(row["destruction_date"], today_iso());
        assert_eq!(row["created_by"], "dev-admin");
        assert_eq!(row["certificate_issued"], false);
    }

    #[test]
    fn filters_and_summary() {
        let pool = setup();
        create_record(&pool.conn, &record("2025-01-05", "Acme Corp", "amy", true), "x").unwrap();
        create_record(&pool.conn, &record("2025-02-05", "Globex", "amy", false), "x").unwrap();
        create_record(&pool.conn, &record("2025-03-05", "Acme Corp", "bob", true), "x").unwrap();

        let acme = list_records(
            &pool.conn,
            &DestructionFilter { client_name: Some("acme".into()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(acme.len(), 2);
        assert_eq!(acme[0]["destruction_date"], "2025-03-05");

        let feb_on = DateRange { start_date: Some("2025-02-01".into()), end_date: None };
        let s = stats_summary(&pool.conn, &feb_on).unwrap();
        assert_eq!(s["total_destroyed"], 2);
        assert_eq!(s["certificates_issued"], 1);
        assert_eq!(s["techs_involved"], 2);

        let by_tech = stats_by_tech(&pool.conn).unwrap();
        assert_eq!(by_tech[0]["destroyed_by"], "amy");
        assert_eq!(by_tech[0]["count"], 2);
        assert_eq!(by_tech[0]["first_destruction"], "2025-01-05");
    }

    #[test]
    fn update_and_delete() {
        let pool = setup();
        let row = create_record(&pool.conn, &record("2025-01-05", "Acme", "amy", false), "x").unwrap();
        let id = row["id"].as_i64().unwrap();

        let changed = update_record(
            &pool.conn,
            id,
            &DestructionInput { witness: Some("carl".into()), ..Default::default() },
            "editor",
        )
        .unwrap()
        .unwrap();
        assert_eq!(changed["witness"], "carl");
        assert_eq!(changed["destruction_date"], "2025-01-05");
        assert_eq!(changed["updated_by"], "editor");
        assert!(changed["client_name"].is_null());

        let gone = delete_record(&pool.conn, id).unwrap().unwrap();
        assert_eq!(gone["id"], id);
        assert!(delete_record(&pool.conn, id).unwrap().is_none());
        assert!(update_record(&pool.conn, id, &DestructionInput::default(), "x").unwrap().is_none());
    }
}
