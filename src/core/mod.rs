pub mod config;
pub mod log;
pub mod password;
pub mod schedule;
pub mod user;
