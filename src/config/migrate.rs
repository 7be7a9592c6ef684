//! Bring an older config file up to the current field set.
//!
//! The file is edited as a YAML mapping so that values the user already set,
//! and keys this version does not know, are left alone.

use super::Config;
use crate::errors::{AppError, AppResult};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

fn current_defaults() -> AppResult<Mapping> {
    match serde_yaml::to_value(Config::default())? {
        Value::Mapping(m) => Ok(m),
        _ => Err(AppError::Config("default config is not a mapping".into())),
    }
}

fn parse_mapping(content: &str) -> AppResult<Mapping> {
    match serde_yaml::from_str::<Value>(content)? {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config("config file is not a YAML mapping".into())),
    }
}

/// Field names present in the defaults but absent from `content`.
pub fn missing_fields(content: &str) -> AppResult<Vec<String>> {
    let have = parse_mapping(content)?;
    let defaults = current_defaults()?;

    Ok(defaults
        .keys()
        .filter(|k| !have.contains_key(*k))
        .filter_map(|k| k.as_str().map(str::to_string))
        .collect())
}

/// Insert defaults for missing fields. Returns the new YAML and the names
/// that were added.
pub fn fill_missing(content: &str) -> AppResult<(String, Vec<String>)> {
    let mut have = parse_mapping(content)?;
    let defaults = current_defaults()?;
    let mut added = Vec::new();

    for (k, v) in defaults {
        if have.contains_key(&k) {
            continue;
        }
        if let Some(name) = k.as_str() {
            added.push(name.to_string());
        }
        have.insert(k, v);
    }

    let yaml = serde_yaml::to_string(&Value::Mapping(have))?;
    Ok((yaml, added))
}

/// Rewrite the file in place when fields are missing.
pub fn migrate_file(path: &Path) -> AppResult<Vec<String>> {
    let content = fs::read_to_string(path)?;
    let (yaml, added) = fill_missing(&content)?;
    if !added.is_empty() {
        fs::write(path, yaml)?;
    }
    Ok(added)
}
