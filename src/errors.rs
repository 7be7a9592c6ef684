//! Unified application error type.
//! Every layer (db, schedule store, cli, server) returns AppError so that the
//! CLI can print it and the HTTP layer can map it to a status code.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing / serialization
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Schedule blobs
    // ---------------------------
    #[error("empty csv")]
    EmptyCsv,

    #[error("header mismatch")]
    HeaderMismatch,

    #[error("row week_start {found} does not match week {expected}")]
    WeekMismatch { expected: String, found: String },

    #[error("day {day} is outside the week starting {week_start}")]
    DayOutsideWeek { day: String, week_start: String },

    #[error("{0} already exists (use --force to overwrite)")]
    FileExists(String),

    // ---------------------------
    // Request-level errors (mapped to HTTP status codes)
    // ---------------------------
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // ---------------------------
    // Save client
    // ---------------------------
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Save rejected by server ({status}): {body}")]
    SaveRejected { status: u16, body: String },

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
