use crate::config::Config;
use crate::config::migrate::{migrate_file, missing_fields};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use std::fs;
use std::path::Path;
use std::process::Command;

pub struct ConfigLogic;

impl ConfigLogic {
    pub fn print(cfg: &Config) -> AppResult<()> {
        info("Current configuration:\n");
        println!("{}", serde_yaml::to_string(cfg)?);
        Ok(())
    }

    /// Report fields the file does not set. Returns how many are missing.
    pub fn check(path: &Path) -> AppResult<usize> {
        if !path.exists() {
            warning(format!("No configuration file at {} (defaults in use)", path.display()));
            return Ok(0);
        }
        let content = fs::read_to_string(path)?;
        let missing = missing_fields(&content)?;
        if missing.is_empty() {
            success("Configuration file is up to date.");
        } else {
            warning(format!("Missing fields: {}", missing.join(", ")));
            info("Run `weeklygrind config --migrate` to add them with default values.");
        }
        Ok(missing.len())
    }

    pub fn migrate(path: &Path) -> AppResult<()> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "no configuration file at {} (run `weeklygrind init`)",
                path.display()
            )));
        }
        let added = migrate_file(path)?;
        if added.is_empty() {
            success("Configuration file already complete.");
        } else {
            success(format!("Added default values for: {}", added.join(", ")));
        }
        Ok(())
    }

    fn default_editor() -> String {
        std::env::var("EDITOR")
            .or_else(|_| std::env::var("VISUAL"))
            .unwrap_or_else(|_| {
                if cfg!(target_os = "windows") {
                    "notepad".to_string()
                } else {
                    "nano".to_string()
                }
            })
    }

    fn run_editor(editor: &str, path: &Path) -> bool {
        Command::new(editor).arg(path).status().is_ok_and(|s| s.success())
    }

    /// Open the file in `editor`, falling back to $EDITOR/$VISUAL or the
    /// platform default.
    pub fn edit(path: &Path, editor: Option<&str>) -> AppResult<()> {
        let fallback = Self::default_editor();
        let wanted = editor.map(str::to_string).unwrap_or_else(|| fallback.clone());

        if Self::run_editor(&wanted, path) {
            success(format!("Configuration file edited using '{wanted}'"));
            return Ok(());
        }
        if wanted != fallback {
            warning(format!("Editor '{wanted}' not available, falling back to '{fallback}'"));
            if Self::run_editor(&fallback, path) {
                success(format!("Configuration file edited using fallback '{fallback}'"));
                return Ok(());
            }
        }
        Err(AppError::Config(format!("failed to edit {}", path.display())))
    }
}
