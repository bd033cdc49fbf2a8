// Shared harness for the binary tests: a temporary HOME with its own rc file
#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tempfile::TempDir;

/// HOME is process-wide, so tests touching it run one at a time
pub fn lock_test_env() -> MutexGuard<'static, ()> {
    static TEST_ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    TEST_ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner())
}

/// Create a temporary database and set it as the data location
pub fn setup_test_env() -> (TempDir, MutexGuard<'static, ()>) {
    let guard = lock_test_env();
    let temp_dir = TempDir::new().unwrap();

    // Create config file
    let config_dir = temp_dir.path().join(".shukatsu");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("rc"), format!("data.location={}\n", db_path(&temp_dir).display())).unwrap();

    // Set HOME to temp_dir so the config file is found
    std::env::set_var("HOME", temp_dir.path().to_str().unwrap());
    (temp_dir, guard)
}

pub fn db_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("test.db")
}

pub fn rc_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join(".shukatsu").join("rc")
}

pub fn get_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shukatsu").unwrap();
    cmd.env("HOME", temp_dir.path());
    cmd
}

/// Parse a command's stdout as JSON
pub fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    serde_json::from_str(&stdout).unwrap()
}
