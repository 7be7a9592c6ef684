use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::server::auth::SessionStore;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Runtime knobs the handlers read.
#[derive(Debug, Clone)]
pub struct Settings {
    pub dev_auth_stub: bool,
    pub hold_days: u32,
    pub session_ttl: Duration,
    pub max_body_bytes: usize,
    pub static_dir: Option<String>,
}

impl Settings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            dev_auth_stub: cfg.dev_auth_stub,
            hold_days: cfg.hold_days,
            session_ttl: Duration::from_secs(cfg.session_ttl_minutes * 60),
            max_body_bytes: cfg.max_body_bytes,
            static_dir: cfg.static_dir.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    pub sessions: Arc<SessionStore>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(conn: Connection, settings: Settings) -> Self {
        let sessions = SessionStore::new(settings.session_ttl);
        Self {
            db: Arc::new(Mutex::new(conn)),
            sessions: Arc::new(sessions),
            settings: Arc::new(settings),
        }
    }

    /// Run `f` with the connection locked. Keep it to one statement or one
    /// transaction.
    pub fn with_db<T>(&self, f: impl FnOnce(&mut Connection) -> AppResult<T>) -> AppResult<T> {
        let mut conn = self
            .db
            .lock()
            .map_err(|_| AppError::Other("database lock poisoned".into()))?;
        f(&mut conn)
    }
}
