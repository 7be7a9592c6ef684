pub mod destruction;
pub mod equipment;
pub mod initialize;
pub mod log;
pub mod migrate;
pub mod pool;
pub mod projects;
pub mod rows;
pub mod schedule;
pub mod stats;
pub mod users;
