use crate::errors::{AppError, AppResult};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Longest accepted list name. Keeps `ok:<name>:<id>` inside Telegram's
/// 64-byte callback payload limit.
pub const MAX_NAME_LEN: usize = 40;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("static regex"));

/// Validated task list name: ASCII letters, digits and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreName(String);

impl StoreName {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let name = raw.trim();
        if name.is_empty() || name.len() > MAX_NAME_LEN || !NAME_RE.is_match(name) {
            return Err(AppError::InvalidName(raw.to_string()));
        }
        Ok(StoreName(name.to_string()))
    }

    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StoreName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
