//! Unified application error type.
//! All modules (db, core, bot, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

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
    // Registry / store errors
    // ---------------------------
    #[error("Invalid list name: {0}")]
    InvalidName(String),

    #[error("List already exists: {0}")]
    AlreadyExists(String),

    #[error("List not found: {0}")]
    StoreNotFound(String),

    #[error("Task {id} not found in list {store}")]
    TaskNotFound { store: String, id: i64 },

    #[error("List limit reached ({0} lists per user)")]
    QuotaExceeded(usize),

    #[error("Task text cannot be empty")]
    EmptyText,

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    // ---------------------------
    // Delivery / transport
    // ---------------------------
    #[error("Reminder delivery failed: {0}")]
    Delivery(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// True for both "missing list" and "missing task".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::StoreNotFound(_) | AppError::TaskNotFound { .. }
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
