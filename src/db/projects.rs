use crate::db::rows::{placeholders, query_json, query_one_json};
use crate::errors::{AppError, AppResult};
use rusqlite::Connection;
use rusqlite::types::ToSql;
use serde::Deserialize;
use serde_json::Value;

const LIST_COLUMNS: &str = "pid, client_id, project_name, status, assigned_tech_id,
    date_project_opened, date_hardware_received, date_last_contacted, customer_temp,
    days_open, config_goal_date, days_past_config_goal, project_goal_date,
    days_past_project_goal, days_since_comms";

/// Project form as posted by the UI. Numeric fields arrive as numbers or
/// numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectInput {
    pub pid: Option<String>,
    pub client_id: Option<String>,
    pub project_name: Option<String>,
    pub description: Option<String>,
    pub num_desktops: Option<Value>,
    pub num_laptops: Option<Value>,
    pub num_images: Option<Value>,
    pub onsite_or_ship: Option<String>,
    pub onsite_scheduled: Option<Value>,
    pub onsite_date: Option<String>,
    pub date_project_opened: Option<String>,
    pub date_hardware_received: Option<String>,
    pub hardware_eta: Option<String>,
    pub assigned_tech_id: Option<Value>,
    pub date_last_contacted: Option<String>,
    pub contact_method: Option<String>,
    pub customer_temp: Option<Value>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn lenient_int(v: &Option<Value>) -> Option<i64> {
    match v.as_ref()? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn lenient_bool(v: &Option<Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

impl ProjectInput {
    /// The three fields a project cannot exist without.
    pub fn required(&self) -> AppResult<(&str, &str, &str)> {
        match (
            non_empty(&self.pid),
            non_empty(&self.project_name),
            non_empty(&self.date_project_opened),
        ) {
            (Some(pid), Some(name), Some(opened)) => Ok((pid, name, opened)),
            _ => Err(AppError::BadRequest(
                "pid, project_name, and date_project_opened are required".into(),
            )),
        }
    }
}

/// Newest first, at most 100. `visible` restricts to assigned techs; an
/// empty list means nothing is visible.
pub fn list_projects(conn: &Connection, visible: Option<&[i64]>) -> AppResult<Vec<Value>> {
    match visible {
        None => Ok(query_json(
            conn,
            &format!(
                "SELECT {LIST_COLUMNS} FROM project_metrics_view
                 ORDER BY date_project_opened DESC LIMIT 100"
            ),
            &[],
        )?),
        Some([]) => Ok(Vec::new()),
        Some(ids) => {
            let sql = format!(
                "SELECT {LIST_COLUMNS} FROM project_metrics_view
                 WHERE assigned_tech_id IN ({})
                 ORDER BY date_project_opened DESC LIMIT 100",
                placeholders(ids.len())
            );
            let params: Vec<&dyn ToSql> = ids.iter().map(|id| id as &dyn ToSql).collect();
            Ok(query_json(conn, &sql, &params)?)
        }
    }
}

pub fn get_project(conn: &Connection, pid: &str) -> AppResult<Option<Value>> {
    Ok(query_one_json(
        conn,
        "SELECT * FROM project_metrics_view WHERE pid = ?1",
        &[&pid],
    )?)
}

/// Insert or replace by pid and return the metrics row.
pub fn upsert_project(conn: &mut Connection, input: &ProjectInput) -> AppResult<Value> {
    let (pid, project_name, opened) = input.required()?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO projects (
            pid, client_id, project_name, description,
            num_desktops, num_laptops, num_images,
            onsite_or_ship, onsite_scheduled, onsite_date,
            date_project_opened, date_hardware_received, hardware_eta,
            assigned_tech_id, date_last_contacted, contact_method,
            customer_temp, status, notes
        ) VALUES (
            ?1, ?2, ?3, ?4,
            COALESCE(?5, 0), COALESCE(?6, 0), COALESCE(?7, 0),
            ?8, ?9, ?10,
            ?11, ?12, ?13,
            ?14, ?15, ?16,
            ?17, ?18, ?19
        )
        ON CONFLICT(pid) DO UPDATE SET
            client_id              = excluded.client_id,
            project_name           = excluded.project_name,
            description            = excluded.description,
            num_desktops           = excluded.num_desktops,
            num_laptops            = excluded.num_laptops,
            num_images             = excluded.num_images,
            onsite_or_ship         = excluded.onsite_or_ship,
            onsite_scheduled       = excluded.onsite_scheduled,
            onsite_date            = excluded.onsite_date,
            date_project_opened    = excluded.date_project_opened,
            date_hardware_received = excluded.date_hardware_received,
            hardware_eta           = excluded.hardware_eta,
            assigned_tech_id       = excluded.assigned_tech_id,
            date_last_contacted    = excluded.date_last_contacted,
            contact_method         = excluded.contact_method,
            customer_temp          = excluded.customer_temp,
            status                 = excluded.status,
            notes                  = excluded.notes,
            updated_at             = datetime('now')",
        rusqlite::params![
            pid,
            non_empty(&input.client_id),
            project_name,
            non_empty(&input.description),
            lenient_int(&input.num_desktops),
            lenient_int(&input.num_laptops),
            lenient_int(&input.num_images),
            non_empty(&input.onsite_or_ship),
            lenient_bool(&input.onsite_scheduled),
            non_empty(&input.onsite_date),
            opened,
            non_empty(&input.date_hardware_received),
            non_empty(&input.hardware_eta),
            lenient_int(&input.assigned_tech_id),
            non_empty(&input.date_last_contacted),
            non_empty(&input.contact_method),
            lenient_int(&input.customer_temp),
            non_empty(&input.status).unwrap_or("open"),
            non_empty(&input.notes),
        ],
    )?;

    let row = query_one_json(&tx, "SELECT * FROM project_metrics_view WHERE pid = ?1", &[&pid])?
        .ok_or_else(|| AppError::Other(format!("project {pid} missing after upsert")))?;
    tx.commit()?;
    Ok(row)
}

/// Returns false when no such project exists.
pub fn delete_project(conn: &Connection, pid: &str) -> AppResult<bool> {
    Ok(conn.execute("DELETE FROM projects WHERE pid = ?1", [pid])? > 0)
}

/// Whether a visible tech list admits this project row. Unassigned
/// projects are only visible to unrestricted roles.
pub fn is_visible(project: &Value, visible: Option<&[i64]>) -> bool {
    match visible {
        None => true,
        Some(ids) => project
            .get("assigned_tech_id")
            .and_then(Value::as_i64)
            .is_some_and(|id| ids.contains(&id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize::init_db;
    use crate::db::pool::DbPool;
    use crate::db::users::create_user;
    use crate::models::role::Role;
    use serde_json::json;

    fn setup() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        pool
    }

    fn input(v: Value) -> ProjectInput {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let mut pool = setup();
        let err = upsert_project(&mut pool.conn, &input(json!({"pid": "P1", "project_name": ""})))
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn upsert_inserts_then_updates() {
        let mut pool = setup();
        let tech = create_user(&pool.conn, "amy", "Amy", None, Role::Tech, "x").unwrap();

        let row = upsert_project(
            &mut pool.conn,
            &input(json!({
                "pid": "P1",
                "project_name": "Refresh",
                "date_project_opened": "2025-09-01",
                "date_hardware_received": "2025-09-03",
                "num_laptops": "12",
                "onsite_scheduled": "true",
                "assigned_tech_id": tech.id,
                "customer_temp": ""
            })),
        )
        .unwrap();
        assert_eq!(row["num_laptops"], 12);
        assert_eq!(row["onsite_scheduled"], true);
        assert_eq!(row["status"], "open");
        assert_eq!(row["config_goal_date"], "2025-09-10");
        assert_eq!(row["project_goal_date"], "2025-10-01");
        assert!(row["customer_temp"].is_null());

        let row = upsert_project(
            &mut pool.conn,
            &input(json!({"pid": "P1", "project_name": "Refresh v2", "date_project_opened": "2025-09-01", "status": "closed"})),
        )
        .unwrap();
        assert_eq!(row["project_name"], "Refresh v2");
        assert_eq!(row["status"], "closed");
        assert!(row["assigned_tech_id"].is_null());
        assert_eq!(list_projects(&pool.conn, None).unwrap().len(), 1);
    }

    #[test]
    fn listing_is_scoped_and_newest_first() {
        let mut pool = setup();
        let a = create_user(&pool.conn, "a", "A", None, Role::Tech, "x").unwrap();
        let b = create_user(&pool.conn, "b", "B", None, Role::Tech, "x").unwrap();

        for (pid, opened, tech) in [("P1", "2025-01-01", a.id), ("P2", "2025-03-01", b.id), ("P3", "2025-02-01", a.id)] {
            upsert_project(
                &mut pool.conn,
                &input(json!({"pid": pid, "project_name": pid, "date_project_opened": opened, "assigned_tech_id": tech})),
            )
            .unwrap();
        }

        let all = list_projects(&pool.conn, None).unwrap();
        let pids: Vec<_> = all.iter().map(|p| p["pid"].as_str().unwrap()).collect();
        assert_eq!(pids, ["P2", "P3", "P1"]);

        let mine = list_projects(&pool.conn, Some(&[a.id])).unwrap();
        assert_eq!(mine.len(), 2);
        assert!(list_projects(&pool.conn, Some(&[])).unwrap().is_empty());

        let p2 = get_project(&pool.conn, "P2").unwrap().unwrap();
        assert!(!is_visible(&p2, Some(&[a.id])));
        assert!(is_visible(&p2, Some(&[b.id])));
        assert!(is_visible(&p2, None));
    }

    #[test]
    fn delete_reports_missing_rows() {
        let mut pool = setup();
        upsert_project(
            &mut pool.conn,
            &input(json!({"pid": "P1", "project_name": "x", "date_project_opened": "2025-01-01"})),
        )
        .unwrap();
        assert!(delete_project(&pool.conn, "P1").unwrap());
        assert!(!delete_project(&pool.conn, "P1").unwrap());
        assert!(get_project(&pool.conn, "P1").unwrap().is_none());
    }
}
