use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// A schema step, applied once and recorded in `log`.
struct Migration {
    version: &'static str,
    message: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20251001_0001_create_users",
        message: "Created users and role mapping tables",
        sql: r#"
        CREATE TABLE IF NOT EXISTS users (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            username      TEXT NOT NULL UNIQUE,
            display_name  TEXT NOT NULL,
            email         TEXT,
            role          TEXT NOT NULL
                          CHECK(role IN ('admin','coordinator','supervisor','manager','tech')),
            password_hash TEXT,
            active        INTEGER NOT NULL DEFAULT 1,
            is_active     INTEGER NOT NULL DEFAULT 1,
            created_at    TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS supervisor_techs (
            supervisor_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            tech_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (supervisor_id, tech_id)
        );

        CREATE TABLE IF NOT EXISTS manager_supervisors (
            manager_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            supervisor_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (manager_id, supervisor_id)
        );
        "#,
    },
    Migration {
        version: "20251001_0002_create_week_schedules",
        message: "Created week_schedules table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS week_schedules (
            week_start TEXT PRIMARY KEY,
            csv        TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    },
    Migration {
        version: "20251001_0003_create_projects",
        message: "Created projects table and project_metrics_view",
        sql: r#"
        CREATE TABLE IF NOT EXISTS projects (
            pid                    TEXT PRIMARY KEY,
            client_id              TEXT,
            project_name           TEXT NOT NULL,
            description            TEXT,
            num_desktops           INTEGER NOT NULL DEFAULT 0,
            num_laptops            INTEGER NOT NULL DEFAULT 0,
            num_images             INTEGER NOT NULL DEFAULT 0,
            onsite_or_ship         TEXT,
            onsite_scheduled       INTEGER NOT NULL DEFAULT 0,
            onsite_date            TEXT,
            date_project_opened    TEXT NOT NULL,
            date_hardware_received TEXT,
            hardware_eta           TEXT,
            assigned_tech_id       INTEGER REFERENCES users(id) ON DELETE SET NULL,
            date_last_contacted    TEXT,
            contact_method         TEXT,
            customer_temp          INTEGER,
            status                 TEXT NOT NULL DEFAULT 'open',
            notes                  TEXT,
            created_at             TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at             TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_projects_tech ON projects(assigned_tech_id);

        CREATE VIEW IF NOT EXISTS project_metrics_view AS
        SELECT
            p.*,
            CAST(julianday('now') - julianday(p.date_project_opened) AS INTEGER) AS days_open,
            date(p.date_hardware_received, '+7 days') AS config_goal_date,
            CASE WHEN p.date_hardware_received IS NULL THEN NULL
                 ELSE MAX(0, CAST(julianday('now') - julianday(p.date_hardware_received, '+7 days') AS INTEGER))
            END AS days_past_config_goal,
            date(p.date_project_opened, '+30 days') AS project_goal_date,
            MAX(0, CAST(julianday('now') - julianday(p.date_project_opened, '+30 days') AS INTEGER))
                AS days_past_project_goal,
            CASE WHEN p.date_last_contacted IS NULL THEN NULL
                 ELSE CAST(julianday('now') - julianday(p.date_last_contacted) AS INTEGER)
            END AS days_since_comms
        FROM projects p;
        "#,
    },
    Migration {
        version: "20251001_0004_create_equipment",
        message: "Created equipment_checkin and hard_drives tables",
        sql: r#"
        CREATE TABLE IF NOT EXISTS equipment_checkin (
            id                         INTEGER PRIMARY KEY AUTOINCREMENT,
            ticket_number              TEXT,
            client_id                  TEXT,
            equipment_name             TEXT,
            equipment_type             TEXT,
            equipment_model            TEXT,
            equipment_serial           TEXT,
            checkin_date               TEXT NOT NULL,
            checked_in_by              TEXT,
            hold_until_date            TEXT,
            ready_for_destruction_date TEXT,
            status                     TEXT NOT NULL DEFAULT 'checked_in',
            current_location           TEXT NOT NULL DEFAULT 'receiving',
            notes                      TEXT,
            created_at                 TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at                 TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS hard_drives (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            equipment_id        INTEGER NOT NULL REFERENCES equipment_checkin(id) ON DELETE CASCADE,
            drive_serial_number TEXT,
            drive_manufacturer  TEXT,
            drive_model         TEXT,
            drive_capacity      TEXT,
            status              TEXT NOT NULL DEFAULT 'checked_in',
            destruction_date    TEXT,
            destruction_method  TEXT,
            destroyed_by        TEXT,
            batch_number        TEXT,
            witness             TEXT,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_equipment_status ON equipment_checkin(status);
        CREATE INDEX IF NOT EXISTS idx_drives_equipment ON hard_drives(equipment_id);
        "#,
    },
    Migration {
        version: "20251001_0005_create_destruction",
        message: "Created hard_drive_destruction table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS hard_drive_destruction (
            id                      INTEGER PRIMARY KEY AUTOINCREMENT,
            destruction_date        TEXT NOT NULL,
            client_name             TEXT,
            client_id               TEXT,
            drive_serial_number     TEXT,
            drive_manufacturer      TEXT,
            drive_model             TEXT,
            drive_capacity          TEXT,
            drive_type              TEXT,
            destruction_method      TEXT,
            destroyed_by            TEXT,
            witness                 TEXT,
            certificate_number      TEXT,
            asset_tag               TEXT,
            original_location       TEXT,
            department              TEXT,
            status                  TEXT NOT NULL DEFAULT 'completed',
            notes                   TEXT,
            special_requirements    TEXT,
            compliance_standard     TEXT,
            batch_number            TEXT,
            certificate_issued      INTEGER NOT NULL DEFAULT 0,
            certificate_issued_date TEXT,
            created_at              TEXT NOT NULL DEFAULT (datetime('now')),
            created_by              TEXT,
            updated_at              TEXT,
            updated_by              TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_destruction_date ON hard_drive_destruction(destruction_date);
        "#,
    },
];

/// Ensure that the `log` table exists. Migrations are tracked in it.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare_cached(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(m.sql)
        .map_err(|e| AppError::Migration(format!("{}: {}", m.version, e)))?;

    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [m.version, m.message],
    )?;

    tx.commit()?;
    Ok(())
}

/// Versions not yet recorded in `log`.
pub fn pending_migrations(conn: &Connection) -> AppResult<Vec<&'static str>> {
    ensure_log_table(conn)?;

    let mut out = Vec::new();
    for m in MIGRATIONS {
        if !is_applied(conn, m.version)? {
            out.push(m.version);
        }
    }
    Ok(out)
}

/// Public entry point: run all pending migrations, in order.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> AppResult<usize> {
    ensure_log_table(conn)?;

    let mut applied = 0;
    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }
        apply(conn, m)?;
        success(format!("Migration applied: {} → {}", m.version, m.message));
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::DbPool;

    #[test]
    fn migrations_are_idempotent() {
        let pool = DbPool::in_memory().unwrap();

        let first = run_pending_migrations(&pool.conn).unwrap();
        assert_eq!(first, MIGRATIONS.len());
        assert!(pending_migrations(&pool.conn).unwrap().is_empty());

        let second = run_pending_migrations(&pool.conn).unwrap();
        assert_eq!(second, 0);

        let recorded: i64 = pool
            .conn
            .query_row(
                "SELECT COUNT(*) FROM log WHERE operation = 'migration_applied'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(recorded as usize, MIGRATIONS.len());
    }

    #[test]
    fn fresh_database_reports_every_migration_pending() {
        let pool = DbPool::in_memory().unwrap();
        assert_eq!(pending_migrations(&pool.conn).unwrap().len(), MIGRATIONS.len());
    }
}
