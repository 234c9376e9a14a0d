use crate::config::Config;
use crate::db::registry::Registry;

pub mod config;
pub mod db;
pub mod init;
pub mod log;
pub mod run;
pub mod scan;

/// Registry rooted at the configured data directory.
pub fn open_registry(cfg: &Config) -> Registry {
    Registry::new(cfg.data_path(), cfg.max_stores_per_user)
}
