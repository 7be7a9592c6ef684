//! Equipment check-in and the hard drives pulled from it.

use crate::db::rows::{Filters, query_json, query_one_json};
use crate::errors::{AppError, AppResult};
use crate::utils::date::today_iso;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EquipmentInput {
    pub ticket_number: Option<String>,
    pub client_id: Option<String>,
    pub equipment_name: Option<String>,
    pub equipment_type: Option<String>,
    pub equipment_model: Option<String>,
    pub equipment_serial: Option<String>,
    pub checkin_date: Option<String>,
    pub checked_in_by: Option<String>,
    pub status: Option<String>,
    pub current_location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriveInput {
    pub drive_serial_number: Option<String>,
    pub drive_manufacturer: Option<String>,
    pub drive_model: Option<String>,
    pub drive_capacity: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckinRequest {
    #[serde(default)]
    pub equipment: EquipmentInput,
    #[serde(default)]
    pub drives: Vec<DriveInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EquipmentFilter {
    pub status: Option<String>,
    pub ticket_number: Option<String>,
    pub client_id: Option<String>,
    pub past_hold: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchDestroy {
    #[serde(default)]
    pub drive_ids: Vec<i64>,
    pub destruction_method: Option<String>,
    pub destroyed_by: Option<String>,
    pub batch_number: Option<String>,
    pub witness: Option<String>,
}

fn set(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

fn drives_of(conn: &Connection, equipment_id: i64) -> AppResult<Vec<Value>> {
    Ok(query_json(
        conn,
        "SELECT * FROM hard_drives WHERE equipment_id = ?1 ORDER BY id",
        &[&equipment_id],
    )?)
}

fn equipment_row(conn: &Connection, id: i64) -> AppResult<Option<Value>> {
    Ok(query_one_json(conn, "SELECT * FROM equipment_checkin WHERE id = ?1", &[&id])?)
}

/// Insert the device and its drives in one transaction. The hold ends
/// `hold_days` after check-in.
pub fn create_checkin(conn: &mut Connection, req: &CheckinRequest, hold_days: u32) -> AppResult<Value> {
    let eq = &req.equipment;
    let checkin_date = set(&eq.checkin_date).map(str::to_string).unwrap_or_else(today_iso);
    let hold_modifier = format!("+{hold_days} days");

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO equipment_checkin (
            ticket_number, client_id, equipment_name, equipment_type,
            equipment_model, equipment_serial, checkin_date, checked_in_by,
            hold_until_date, status, current_location, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, date(?7, ?9), ?10, ?11, ?12)",
        params![
            eq.ticket_number,
            eq.client_id,
            eq.equipment_name,
            eq.equipment_type,
            eq.equipment_model,
            eq.equipment_serial,
            checkin_date,
            eq.checked_in_by,
            hold_modifier,
            set(&eq.status).unwrap_or("checked_in"),
            set(&eq.current_location).unwrap_or("receiving"),
            eq.notes,
        ],
    )?;
    let equipment_id = tx.last_insert_rowid();

    {
        let mut ins = tx.prepare(
            "INSERT INTO hard_drives (
                equipment_id, drive_serial_number, drive_manufacturer,
                drive_model, drive_capacity, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, 'checked_in')",
        )?;
        for d in &req.drives {
            ins.execute(params![
                equipment_id,
                d.drive_serial_number,
                d.drive_manufacturer,
                d.drive_model,
                d.drive_capacity,
            ])?;
        }
    }

    let equipment = equipment_row(&tx, equipment_id)?
        .ok_or_else(|| AppError::Other(format!("equipment {equipment_id} missing after insert")))?;
    let drives = drives_of(&tx, equipment_id)?;
    tx.commit()?;

    Ok(json!({ "equipment": equipment, "drives": drives }))
}

pub fn list_equipment(conn: &Connection, filter: &EquipmentFilter) -> AppResult<Vec<Value>> {
    let mut f = Filters::new();
    if let Some(s) = set(&filter.status) {
        f.push("e.status = ?", s);
    }
    if let Some(t) = set(&filter.ticket_number) {
        f.push("e.ticket_number LIKE ?", format!("%{t}%"));
    }
    if let Some(c) = set(&filter.client_id) {
        f.push("e.client_id LIKE ?", format!("%{c}%"));
    }
    if filter.past_hold.as_deref() == Some("true") {
        f.push_raw("e.hold_until_date < date('now') AND e.status = 'checked_in'");
    }
    if let Some(d) = set(&filter.start_date) {
        f.push("e.checkin_date >= ?", d);
    }
    if let Some(d) = set(&filter.end_date) {
        f.push("e.checkin_date <= ?", d);
    }

    let sql = format!(
        "SELECT e.*,
                date('now') > e.hold_until_date AS is_past_hold,
                CAST(julianday(date('now')) - julianday(e.hold_until_date) AS INTEGER) AS days_past_hold,
                COUNT(h.id) AS drive_count
         FROM equipment_checkin e
         LEFT JOIN hard_drives h ON e.id = h.equipment_id
         {}
         GROUP BY e.id
         ORDER BY e.checkin_date DESC, e.id DESC",
        f.where_sql()
    );
    Ok(query_json(conn, &sql, &f.params())?)
}

/// `{equipment, drives}` or `None`.
pub fn get_equipment(conn: &Connection, id: i64) -> AppResult<Option<Value>> {
    let Some(equipment) = equipment_row(conn, id)? else {
        return Ok(None);
    };
    let drives = drives_of(conn, id)?;
    Ok(Some(json!({ "equipment": equipment, "drives": drives })))
}

pub fn update_equipment(conn: &Connection, id: i64, input: &EquipmentInput) -> AppResult<Option<Value>> {
    let changed = conn.execute(
        "UPDATE equipment_checkin SET
            ticket_number    = ?1,
            client_id        = ?2,
            equipment_name   = ?3,
            equipment_type   = ?4,
            equipment_model  = ?5,
            equipment_serial = ?6,
            status           = COALESCE(?7, status),
            current_location = COALESCE(?8, current_location),
            notes            = ?9,
            updated_at       = datetime('now')
         WHERE id = ?10",
        params![
            input.ticket_number,
            input.client_id,
            input.equipment_name,
            input.equipment_type,
            input.equipment_model,
            input.equipment_serial,
            set(&input.status),
            set(&input.current_location),
            input.notes,
            id
        ],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    equipment_row(conn, id)
}

/// Drives go with it (foreign key cascade).
pub fn delete_equipment(conn: &Connection, id: i64) -> AppResult<bool> {
    Ok(conn.execute("DELETE FROM equipment_checkin WHERE id = ?1", [id])? > 0)
}

pub fn stats_summary(conn: &Connection) -> AppResult<Value> {
    let mut summary = query_one_json(
        conn,
        "SELECT
            COUNT(*) AS total_equipment,
            COUNT(DISTINCT client_id) AS total_clients,
            IFNULL(SUM(CASE WHEN status = 'checked_in' THEN 1 ELSE 0 END), 0) AS checked_in,
            IFNULL(SUM(CASE WHEN status = 'ready_for_destruction' THEN 1 ELSE 0 END), 0) AS ready,
            IFNULL(SUM(CASE WHEN status = 'destroyed' THEN 1 ELSE 0 END), 0) AS destroyed,
            IFNULL(SUM(CASE WHEN hold_until_date < date('now') AND status = 'checked_in' THEN 1 ELSE 0 END), 0) AS past_hold
         FROM equipment_checkin",
        &[],
    )?
    .unwrap_or_else(|| json!({}));

    let total_drives: i64 = conn.query_row("SELECT COUNT(*) FROM hard_drives", [], |r| r.get(0))?;
    if let Some(obj) = summary.as_object_mut() {
        obj.insert("total_drives".into(), Value::from(total_drives));
    }
    Ok(summary)
}

/// Still checked in after the hold ended, oldest hold first.
pub fn past_hold(conn: &Connection) -> AppResult<Vec<Value>> {
    Ok(query_json(
        conn,
        "SELECT e.*,
                CAST(julianday(date('now')) - julianday(e.hold_until_date) AS INTEGER) AS days_past_hold,
                COUNT(h.id) AS drive_count
         FROM equipment_checkin e
         LEFT JOIN hard_drives h ON e.id = h.equipment_id
         WHERE e.hold_until_date < date('now')
           AND e.status = 'checked_in'
         GROUP BY e.id
         ORDER BY e.hold_until_date ASC",
        &[],
    )?)
}

/// Flag the device and all of its drives as ready for destruction.
pub fn mark_ready(conn: &mut Connection, id: i64) -> AppResult<Option<Value>> {
    let tx = conn.transaction()?;
    let changed = tx.execute(
        "UPDATE equipment_checkin
         SET status = 'ready_for_destruction',
             ready_for_destruction_date = date('now'),
             updated_at = datetime('now')
         WHERE id = ?1",
        [id],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    tx.execute(
        "UPDATE hard_drives SET status = 'ready_for_destruction' WHERE equipment_id = ?1",
        [id],
    )?;
    let row = equipment_row(&tx, id)?;
    tx.commit()?;
    Ok(row)
}

/// Destroy drives in one batch. Devices left with no live drive become
/// `destroyed`. Returns the number of drive ids submitted.
pub fn batch_destroy(conn: &mut Connection, req: &BatchDestroy) -> AppResult<usize> {
    if req.drive_ids.is_empty() {
        return Err(AppError::BadRequest("No drives specified".into()));
    }
    let today = today_iso();

    let tx = conn.transaction()?;
    {
        let mut upd = tx.prepare(
            "UPDATE hard_drives
             SET status = 'destroyed',
                 destruction_date = ?1,
                 destroyed_by = ?2,
                 destruction_method = ?3,
                 batch_number = ?4,
                 witness = ?5
             WHERE id = ?6",
        )?;
        for id in &req.drive_ids {
            upd.execute(params![
                today,
                req.destroyed_by,
                req.destruction_method,
                req.batch_number,
                req.witness,
                id
            ])?;
        }

        let mut owners = tx.prepare("SELECT equipment_id FROM hard_drives WHERE id = ?1")?;
        let mut pending = tx.prepare(
            "SELECT COUNT(*) FROM hard_drives WHERE equipment_id = ?1 AND status != 'destroyed'",
        )?;
        let mut finish = tx.prepare(
            "UPDATE equipment_checkin SET status = 'destroyed', updated_at = datetime('now') WHERE id = ?1",
        )?;

        let mut equipment_ids: Vec<i64> = Vec::new();
        for id in &req.drive_ids {
            let owner: Option<i64> = owners.query_row([id], |r| r.get(0)).optional()?;
            if let Some(eid) = owner
                && !equipment_ids.contains(&eid)
            {
                equipment_ids.push(eid);
            }
        }

        for eid in equipment_ids {
            let left: i64 = pending.query_row([eid], |r| r.get(0))?;
            if left == 0 {
                finish.execute([eid])?;
            }
        }
    }
    tx.commit()?;

    Ok(req.drive_ids.len())
}

pub fn ready_drives(conn: &Connection) -> AppResult<Vec<Value>> {
    Ok(query_json(
        conn,
        "SELECT h.*,
                e.ticket_number,
                e.client_id,
                e.equipment_name,
                e.equipment_serial,
                e.hold_until_date,
                CAST(julianday(date('now')) - julianday(e.hold_until_date) AS INTEGER) AS days_past_hold
         FROM hard_drives h
         JOIN equipment_checkin e ON h.equipment_id = e.id
         WHERE h.status = 'ready_for_destruction'
         ORDER BY e.hold_until_date ASC, h.id ASC",
        &[],
    )?)
}

pub fn drive_stats(conn: &Connection) -> AppResult<Value> {
    Ok(query_one_json(
        conn,
        "SELECT
            COUNT(*) AS total_drives,
            IFNULL(SUM(CASE WHEN status = 'checked_in' THEN 1 ELSE 0 END), 0) AS checked_in,
            IFNULL(SUM(CASE WHEN status = 'ready_for_destruction' THEN 1 ELSE 0 END), 0) AS ready,
            IFNULL(SUM(CASE WHEN status = 'destroyed' THEN 1 ELSE 0 END), 0) AS destroyed,
            COUNT(DISTINCT batch_number) AS total_batches
         FROM hard_drives",
        &[],
    )?
    .unwrap_or_else(|| json!({})))
}
