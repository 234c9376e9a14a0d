//! Path utilities: expand ~, resolve store files inside a user namespace.

use std::path::{Path, PathBuf};

/// File extension used for every task list file.
pub const STORE_EXT: &str = "sqlite";

pub fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(path.trim_start_matches("~/"));
    }
    PathBuf::from(path)
}

/// `<root>/<user_id>`
pub fn namespace_dir(root: &Path, user_id: i64) -> PathBuf {
    root.join(user_id.to_string())
}

/// `<root>/<user_id>/<name>.sqlite`
pub fn store_file(root: &Path, user_id: i64, name: &str) -> PathBuf {
    namespace_dir(root, user_id).join(format!("{}.{}", name, STORE_EXT))
}

/// Return the store name for a `*.sqlite` path, or None for other files.
pub fn store_stem(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some(STORE_EXT) {
        return None;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
