use crate::bot::api::DEFAULT_API_BASE;
use crate::core::scheduler::DEFAULT_REPEAT_SECS;
use crate::db::registry::DEFAULT_MAX_STORES;
use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod migrate; // use submodule at src/config/migrate.rs

/// Environment variable overriding `bot_token`.
pub const TOKEN_ENV: &str = "RREMINDER_BOT_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_max_stores")]
    pub max_stores_per_user: usize,
    #[serde(default = "default_repeat_interval")]
    pub repeat_interval_secs: i64,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> String {
    Config::config_dir()
        .join("users_data")
        .to_string_lossy()
        .to_string()
}
fn default_api_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_max_stores() -> usize {
    DEFAULT_MAX_STORES
}
fn default_repeat_interval() -> i64 {
    DEFAULT_REPEAT_SECS
}
fn default_poll_timeout() -> u64 {
    30
}
fn default_timezone() -> String {
    "local".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bot_token: String::new(),
            api_base_url: default_api_base_url(),
            max_stores_per_user: default_max_stores(),
            repeat_interval_secs: default_repeat_interval(),
            poll_timeout_secs: default_poll_timeout(),
            timezone: default_timezone(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rreminder")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".rreminder")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rreminder.conf")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        let mut cfg = if path.exists() {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        } else {
            Config::default()
        };
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(token) = env::var(TOKEN_ENV)
            && !token.trim().is_empty()
        {
            self.bot_token = token;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_stores_per_user == 0 {
            return Err(AppError::Config("max_stores_per_user must be > 0".into()));
        }
        if self.repeat_interval_secs <= 0 {
            return Err(AppError::Config("repeat_interval_secs must be > 0".into()));
        }
        crate::utils::time::parse_offset(&self.timezone)?;
        Ok(())
    }

    /// `data_dir` with `~/` expanded.
    pub fn data_path(&self) -> PathBuf {
        expand_tilde(&self.data_dir)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let mut file = fs::File::create(path)?;
        file.write_all(yaml.as_bytes())?;
        Ok(())
    }

    /// Initialize configuration file and data directory.
    /// Returns the data directory.
    pub fn init_all(custom_data_dir: Option<String>, is_test: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let mut config = if Self::config_file().exists() {
            Self::load()?
        } else {
            Config::default()
        };
        if let Some(custom) = custom_data_dir {
            config.data_dir = custom;
        }

        // Write config file
        if !is_test {
            config.save_to(&Self::config_file())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        let data = config.data_path();
        fs::create_dir_all(&data)?;
        println!("✅ Data dir:    {:?}", data);

        Ok(data)
    }
}
