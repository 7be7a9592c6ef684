#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const WEEK: &str = "week_start,tech,day,slot,type,details,notes,status\r\n\
                        2025-09-29,jsmith,2025-09-29,1,IMG,Laptop,,\r\n\
                        2025-09-29,jsmith,2025-09-29,2,CFG,,,\r\n";

/// Binary under test. HOME points at a per-test directory so a real
/// `~/.weeklygrind/weeklygrind.conf` never leaks into a run.
pub fn wg(name: &str) -> Command {
    let mut cmd = cargo_bin_cmd!("weeklygrind");
    cmd.env("HOME", test_home(name));
    cmd.env_remove("RUST_LOG");
    cmd
}

pub fn test_home(name: &str) -> PathBuf {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_weeklygrind_home", name));
    fs::create_dir_all(&path).ok();
    path
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_weeklygrind.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Temp file path with nothing at it yet
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

pub fn write_temp(name: &str, ext: &str, content: &str) -> String {
    let p = temp_out(name, ext);
    fs::write(&p, content).expect("write temp file");
    p
}

/// `init` a fresh database in test mode
pub fn init_test_db(name: &str) -> String {
    let db_path = setup_test_db(name);
    wg(name).args(["--db", &db_path, "--test", "init"]).assert().success();
    db_path
}
