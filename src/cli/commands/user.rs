use crate::cli::parser::{Commands, UserCmd};
use crate::config::Config;
use crate::core::user::UserLogic;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::role::Role;

fn role_arg(raw: &str) -> AppResult<Role> {
    Role::from_code(raw).ok_or_else(|| AppError::InvalidRole(raw.to_string()))
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::User { action } = cmd else {
        return Ok(());
    };
    let pool = DbPool::new(&cfg.database)?;

    match action {
        UserCmd::Add {
            username,
            name,
            email,
            role,
            password,
        } => {
            let display = name.as_deref().unwrap_or(username);
            UserLogic::add(&pool.conn, username, display, email.as_deref(), role_arg(role)?, password)?;
        }
        UserCmd::List { role } => {
            let role = role.as_deref().map(role_arg).transpose()?;
            UserLogic::list(&pool.conn, role)?;
        }
        UserCmd::Passwd { username, password } => {
            UserLogic::passwd(&pool.conn, username, password)?;
        }
    }
    Ok(())
}
