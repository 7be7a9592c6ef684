use crate::core::password::hash_password;
use crate::db::log::audit;
use crate::db::users::{create_user, list_users, set_password_by_username};
use crate::errors::{AppError, AppResult};
use crate::models::role::Role;
use crate::models::user::User;
use crate::ui::messages::success;
use crate::utils::table::{Column, Table};
use rusqlite::Connection;

pub struct UserLogic;

impl UserLogic {
    pub fn add(
        conn: &Connection,
        username: &str,
        display_name: &str,
        email: Option<&str>,
        role: Role,
        password: &str,
    ) -> AppResult<User> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::BadRequest("username and password are required".into()));
        }
        let hash = hash_password(password)?;
        let user = create_user(conn, username.trim(), display_name.trim(), email, role, &hash)?;
        audit(conn, "user_add", &user.username, &format!("role {}", user.role))?;
        success(format!("User '{}' created with role {} (id {})", user.username, user.role, user.id));
        Ok(user)
    }

    pub fn render(users: &[User]) -> String {
        let mut table = Table::new(vec![
            Column::new("ID", 4),
            Column::new("Username", 16),
            Column::new("Name", 24),
            Column::new("Role", 12),
            Column::new("Email", 28),
            Column::new("Active", 6),
        ]);
        for u in users {
            table.add_row(vec![
                u.id.to_string(),
                u.username.clone(),
                u.display_name.clone(),
                u.role.to_string(),
                u.email.clone().unwrap_or_default(),
                if u.is_enabled() { "yes" } else { "no" }.to_string(),
            ]);
        }
        table.render()
    }

    pub fn list(conn: &Connection, role: Option<Role>) -> AppResult<Vec<User>> {
        let users = list_users(conn, role)?;
        print!("{}", Self::render(&users));
        Ok(users)
    }

    pub fn passwd(conn: &Connection, username: &str, password: &str) -> AppResult<()> {
        if password.is_empty() {
            return Err(AppError::BadRequest("Password required".into()));
        }
        let hash = hash_password(password)?;
        if !set_password_by_username(conn, username, &hash)? {
            return Err(AppError::NotFound(format!("user '{username}' not found")));
        }
        audit(conn, "user_passwd", username, "password reset")?;
        success(format!("Password updated for '{username}'"));
        Ok(())
    }
}
