#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, TimeZone, Utc};
use rreminder::db::registry::{DEFAULT_MAX_STORES, Registry};
use std::path::Path;
use tempfile::TempDir;

pub fn rrm() -> Command {
    cargo_bin_cmd!("rreminder")
}

/// Binary isolated from the real home directory and token.
pub fn rrm_in(home: &Path) -> Command {
    let mut cmd = rrm();
    cmd.env("HOME", home)
        .env("APPDATA", home)
        .env_remove("RREMINDER_BOT_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Fresh registry rooted inside a temporary directory. Keep the TempDir
/// alive for as long as the registry is used.
pub fn temp_registry() -> (TempDir, Registry) {
    let dir = TempDir::new().expect("tempdir");
    let registry = Registry::new(dir.path().join("users_data"), DEFAULT_MAX_STORES);
    (dir, registry)
}

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .expect("valid timestamp")
}

/// Registry with one list named `name` for `user_id`.
pub fn registry_with_store(user_id: i64, name: &str) -> (TempDir, Registry) {
    let (dir, registry) = temp_registry();
    registry.create_store(user_id, name).expect("create store");
    (dir, registry)
}
