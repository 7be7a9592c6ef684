use crate::cli::parser::{Commands, ScheduleCmd};
use crate::config::Config;
use crate::core::schedule::ScheduleLogic;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::utils::date::resolve_week;
use chrono::NaiveDate;
use std::path::Path;

fn week_arg(raw: &str) -> AppResult<NaiveDate> {
    resolve_week(raw).ok_or_else(|| AppError::InvalidDate(raw.to_string()))
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Schedule { action } = cmd else {
        return Ok(());
    };

    match action {
        ScheduleCmd::Show { week } => {
            let pool = DbPool::new(&cfg.database)?;
            ScheduleLogic::show(&pool.conn, week_arg(week)?)
        }
        ScheduleCmd::Import { week, file } => {
            let pool = DbPool::new(&cfg.database)?;
            ScheduleLogic::import(&pool.conn, week_arg(week)?, Path::new(file)).map(|_| ())
        }
        ScheduleCmd::Export { week, file, force } => {
            let pool = DbPool::new(&cfg.database)?;
            ScheduleLogic::export(&pool.conn, week_arg(week)?, Path::new(file), *force)
        }
        ScheduleCmd::Apply { file, grid, out } => {
            ScheduleLogic::apply(Path::new(file), Path::new(grid), out.as_deref().map(Path::new)).map(|_| ())
        }
        ScheduleCmd::Build { week, grid, out, force } => {
            ScheduleLogic::build(Path::new(grid), week_arg(week)?, Path::new(out), *force).map(|_| ())
        }
        ScheduleCmd::Push {
            server,
            week,
            file,
            grid,
            json_wrap,
        } => ScheduleLogic::push(
            server,
            week_arg(week)?,
            Path::new(file),
            grid.as_deref().map(Path::new),
            *json_wrap,
        )
        .map(|_| ()),
        ScheduleCmd::Weeks => {
            let pool = DbPool::new(&cfg.database)?;
            ScheduleLogic::weeks(&pool.conn).map(|_| ())
        }
    }
}
