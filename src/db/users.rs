use crate::errors::{AppError, AppResult};
use crate::models::role::Role;
use crate::models::user::{
    ManagerSupervisor, SessionUser, SupervisorTech, User, UserPatch, UserRelations, UserSummary,
};
use rusqlite::{Connection, OptionalExtension, Row, params};

const USER_COLUMNS: &str = "id, username, display_name, email, role, active, is_active";

fn role_from_row(row: &Row, idx: usize) -> rusqlite::Result<Role> {
    let raw: String = row.get(idx)?;
    Role::from_db_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidRole(raw)),
        )
    })
}

fn map_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        email: row.get(3)?,
        role: role_from_row(row, 4)?,
        active: row.get(5)?,
        is_active: row.get(6)?,
    })
}

pub fn list_users(conn: &Connection, role: Option<Role>) -> AppResult<Vec<User>> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE (?1 IS NULL OR role = ?1)
         ORDER BY role, username"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([role.map(|r| r.to_db_str())], map_user)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn get_user(conn: &Connection, id: i64) -> AppResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], map_user).optional()?)
}

/// User plus stored password hash, for login.
pub fn find_for_login(conn: &Connection, username: &str) -> AppResult<Option<(User, Option<String>)>> {
    let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?1");
    let found = conn
        .query_row(&sql, [username], |row| Ok((map_user(row)?, row.get(7)?)))
        .optional()?;
    Ok(found)
}

pub fn create_user(
    conn: &Connection,
    username: &str,
    display_name: &str,
    email: Option<&str>,
    role: Role,
    password_hash: &str,
) -> AppResult<User> {
    conn.execute(
        "INSERT INTO users (username, display_name, email, role, password_hash, active, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, 1)",
        params![username, display_name, email, role.to_db_str(), password_hash],
    )?;

    let id = conn.last_insert_rowid();
    get_user(conn, id)?.ok_or_else(|| AppError::Other(format!("user {id} vanished after insert")))
}

pub fn update_user(conn: &Connection, id: i64, patch: &UserPatch) -> AppResult<Option<User>> {
    let changed = conn.execute(
        "UPDATE users
         SET display_name = COALESCE(?1, display_name),
             email        = COALESCE(?2, email),
             role         = COALESCE(?3, role),
             active       = COALESCE(?4, active),
             is_active    = COALESCE(?5, is_active),
             updated_at   = datetime('now')
         WHERE id = ?6",
        params![
            patch.display_name,
            patch.email,
            patch.role.map(|r| r.to_db_str()),
            patch.active,
            patch.is_active,
            id
        ],
    )?;

    if changed == 0 {
        return Ok(None);
    }
    get_user(conn, id)
}

/// Returns false when the user does not exist.
pub fn set_password(conn: &Connection, id: i64, password_hash: &str) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![password_hash, id],
    )?;
    Ok(changed > 0)
}

pub fn set_password_by_username(conn: &Connection, username: &str, password_hash: &str) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?1, updated_at = datetime('now') WHERE username = ?2",
        params![password_hash, username],
    )?;
    Ok(changed > 0)
}

pub fn relations(conn: &Connection) -> AppResult<UserRelations> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, username, display_name, role FROM users ORDER BY role, username",
    )?;
    let users = stmt
        .query_map([], |row| {
            Ok(UserSummary {
                id: row.get(0)?,
                username: row.get(1)?,
                display_name: row.get(2)?,
                role: role_from_row(row, 3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare_cached("SELECT supervisor_id, tech_id FROM supervisor_techs")?;
    let supervisor_techs = stmt
        .query_map([], |row| {
            Ok(SupervisorTech {
                supervisor_id: row.get(0)?,
                tech_id: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare_cached("SELECT manager_id, supervisor_id FROM manager_supervisors")?;
    let manager_supervisors = stmt
        .query_map([], |row| {
            Ok(ManagerSupervisor {
                manager_id: row.get(0)?,
                supervisor_id: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(UserRelations {
        users,
        supervisor_techs,
        manager_supervisors,
    })
}

/// Replace every tech assigned to a supervisor, atomically.
pub fn replace_supervisor_techs(conn: &mut Connection, supervisor_id: i64, tech_ids: &[i64]) -> AppResult<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM supervisor_techs WHERE supervisor_id = ?1", [supervisor_id])?;
    {
        let mut ins = tx.prepare("INSERT INTO supervisor_techs (supervisor_id, tech_id) VALUES (?1, ?2)")?;
        for tech_id in tech_ids {
            ins.execute([supervisor_id, *tech_id])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Replace every supervisor reporting to a manager, atomically.
pub fn replace_manager_supervisors(
    conn: &mut Connection,
    manager_id: i64,
    supervisor_ids: &[i64],
) -> AppResult<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM manager_supervisors WHERE manager_id = ?1", [manager_id])?;
    {
        let mut ins =
            tx.prepare("INSERT INTO manager_supervisors (manager_id, supervisor_id) VALUES (?1, ?2)")?;
        for sup_id in supervisor_ids {
            ins.execute([manager_id, *sup_id])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Tech ids whose projects `user` may see. `None` means all of them.
pub fn visible_tech_ids(conn: &Connection, user: &SessionUser) -> AppResult<Option<Vec<i64>>> {
    let sql = match user.role {
        Role::Admin | Role::Coordinator => return Ok(None),
        Role::Tech => return Ok(Some(vec![user.id])),
        Role::Supervisor => "SELECT tech_id FROM supervisor_techs WHERE supervisor_id = ?1",
        Role::Manager => {
            "SELECT DISTINCT st.tech_id
             FROM manager_supervisors ms
             JOIN supervisor_techs st ON st.supervisor_id = ms.supervisor_id
             WHERE ms.manager_id = ?1"
        }
    };

    let mut stmt = conn.prepare_cached(sql)?;
    let ids = stmt
        .query_map([user.id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(Some(ids))
}
