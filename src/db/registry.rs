//! Store registry: one directory per user, one SQLite file per task list.
//!
//! ```text
//! <data_dir>/<user_id>/<list_name>.sqlite
//! ```
//!
//! Create/delete of lists is serialized per user, every operation on a single
//! list is serialized per list. Nothing is locked across lists.

use crate::core::source::ReminderSource;
use crate::db::log::ttlog;
use crate::db::migrate::run_pending_migrations;
use crate::db::pool::StorePool;
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{StoreName, Task};
use crate::utils::path::{namespace_dir, store_file, store_stem};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

pub const DEFAULT_MAX_STORES: usize = 20;

/// Result of [`Registry::migrate_all`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationSummary {
    pub stores: usize,
    pub migrated: usize,
    pub failed: usize,
}

pub struct Registry {
    root: PathBuf,
    max_stores: usize,
    user_locks: DashMap<i64, Arc<Mutex<()>>>,
    /// Entries outlive deleted lists: a waiter holding the old lock must
    /// still exclude a re-created list of the same name.
    store_locks: DashMap<(i64, String), Arc<Mutex<()>>>,
}

fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    // The guarded value is `()`, a poisoned lock carries no broken state.
    lock.lock().unwrap_or_else(|e| e.into_inner())
}

impl Registry {
    pub fn new(root: impl Into<PathBuf>, max_stores: usize) -> Self {
        Self {
            root: root.into(),
            max_stores,
            user_locks: DashMap::new(),
            store_locks: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_stores(&self) -> usize {
        self.max_stores
    }

    pub fn store_path(&self, user_id: i64, name: &str) -> PathBuf {
        store_file(&self.root, user_id, name)
    }

    fn user_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        self.user_locks.entry(user_id).or_default().clone()
    }

    fn store_lock(&self, user_id: i64, name: &str) -> Arc<Mutex<()>> {
        self.store_locks
            .entry((user_id, name.to_string()))
            .or_default()
            .clone()
    }

    // ---------------------------
    // Namespaces
    // ---------------------------

    /// Idempotently create `<data_dir>/<user_id>`.
    pub fn ensure_namespace(&self, user_id: i64) -> AppResult<PathBuf> {
        let dir = namespace_dir(&self.root, user_id);
        // create_dir_all tolerates a concurrent creator
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Every numeric directory under the data dir.
    pub fn list_users(&self) -> AppResult<Vec<i64>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut users = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|s| s.parse::<i64>().ok())
            {
                users.push(id);
            }
        }
        users.sort_unstable();
        Ok(users)
    }

    pub fn list_stores(&self, user_id: i64) -> AppResult<BTreeSet<String>> {
        let dir = namespace_dir(&self.root, user_id);
        let mut out = BTreeSet::new();
        if !dir.exists() {
            return Ok(out);
        }

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if let Some(name) = store_stem(&path)
                && StoreName::is_valid(&name)
            {
                out.insert(name);
            }
        }
        Ok(out)
    }

    pub fn can_create(&self, user_id: i64) -> AppResult<bool> {
        Ok(self.list_stores(user_id)?.len() < self.max_stores)
    }

    // ---------------------------
    // Stores
    // ---------------------------

    pub fn create_store(&self, user_id: i64, name: &str) -> AppResult<()> {
        let name = StoreName::parse(name)?;

        let user_lock = self.user_lock(user_id);
        let _user_guard = acquire(&user_lock);

        self.ensure_namespace(user_id)?;
        let path = self.store_path(user_id, name.as_str());

        if path.exists() {
            return Err(AppError::AlreadyExists(name.to_string()));
        }
        if self.list_stores(user_id)?.len() >= self.max_stores {
            return Err(AppError::QuotaExceeded(self.max_stores));
        }

        let store_lock = self.store_lock(user_id, name.as_str());
        let _store_guard = acquire(&store_lock);

        let init = StorePool::create(&path)
            .map_err(AppError::from)
            .and_then(|pool| {
                run_pending_migrations(&pool.conn)?;
                ttlog(
                    &pool.conn,
                    "create_store",
                    name.as_str(),
                    &format!("List created for user {}", user_id),
                )?;
                Ok(())
            });

        if let Err(e) = init {
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        debug!(user_id, store = %name, "list created");
        Ok(())
    }

    pub fn delete_store(&self, user_id: i64, name: &str) -> AppResult<()> {
        let name = StoreName::parse(name).map_err(|_| AppError::StoreNotFound(name.to_string()))?;

        let user_lock = self.user_lock(user_id);
        let _user_guard = acquire(&user_lock);

        let store_lock = self.store_lock(user_id, name.as_str());
        let _store_guard = acquire(&store_lock);

        let path = self.store_path(user_id, name.as_str());
        if !path.exists() {
            return Err(AppError::StoreNotFound(name.to_string()));
        }

        fs::remove_file(&path)?;
        for suffix in ["-journal", "-wal", "-shm"] {
            let mut side = path.clone().into_os_string();
            side.push(suffix);
            let _ = fs::remove_file(PathBuf::from(side));
        }

        debug!(user_id, store = %name, "list deleted");
        Ok(())
    }

    /// Run `f` against an existing list while holding its lock.
    pub fn with_store<T, F>(&self, user_id: i64, name: &str, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let valid = StoreName::parse(name).map_err(|_| AppError::StoreNotFound(name.to_string()))?;

        let lock = self.store_lock(user_id, valid.as_str());
        let _guard = acquire(&lock);

        let path = self.store_path(user_id, valid.as_str());
        if !path.exists() {
            return Err(AppError::StoreNotFound(valid.to_string()));
        }

        let pool = StorePool::open(&path)?;
        f(&pool.conn)
    }

    /// Apply pending migrations to every list of every user.
    pub fn migrate_all(&self) -> AppResult<MigrationSummary> {
        let mut summary = MigrationSummary::default();

        for user_id in self.list_users()? {
            let stores = match self.list_stores(user_id) {
                Ok(s) => s,
                Err(e) => {
                    warn!(user_id, error = %e, "cannot list stores for migration");
                    summary.failed += 1;
                    continue;
                }
            };

            for store in stores {
                summary.stores += 1;
                match self.with_store(user_id, &store, |conn| run_pending_migrations(conn)) {
                    Ok(applied) if !applied.is_empty() => {
                        debug!(user_id, store = %store, ?applied, "migrations applied");
                        summary.migrated += 1;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(user_id, store = %store, error = %e, "migration failed");
                        summary.failed += 1;
                    }
                }
            }
        }

        Ok(summary)
    }

    // ---------------------------
    // Tasks
    // ---------------------------

    pub fn add_task(
        &self,
        user_id: i64,
        store: &str,
        text: &str,
        due_at: DateTime<Utc>,
    ) -> AppResult<i64> {
        let text = text.trim();
        self.with_store(user_id, store, |conn| {
            if text.is_empty() {
                return Err(AppError::EmptyText);
            }

            let tx = conn.unchecked_transaction()?;
            let task = Task::new(text, Utc::now(), due_at);
            let id = queries::insert_task(&tx, &task)?;
            ttlog(&tx, "add_task", store, &format!("Task {} added", id))?;
            tx.commit()?;
            Ok(id)
        })
    }

    pub fn list_tasks(&self, user_id: i64, store: &str) -> AppResult<Vec<Task>> {
        self.with_store(user_id, store, queries::load_tasks)
    }

    pub fn get_task(&self, user_id: i64, store: &str, task_id: i64) -> AppResult<Task> {
        self.with_store(user_id, store, |conn| {
            queries::load_task(conn, task_id)?.ok_or_else(|| AppError::TaskNotFound {
                store: store.to_string(),
                id: task_id,
            })
        })
    }

    /// Deleting an id twice fails with `TaskNotFound` on the second call.
    pub fn delete_task(&self, user_id: i64, store: &str, task_id: i64) -> AppResult<()> {
        self.with_store(user_id, store, |conn| {
            let tx = conn.unchecked_transaction()?;
            if queries::delete_task(&tx, task_id)? == 0 {
                return Err(AppError::TaskNotFound {
                    store: store.to_string(),
                    id: task_id,
                });
            }
            ttlog(&tx, "delete_task", store, &format!("Task {} deleted", task_id))?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Returns `true` if this call confirmed the task, `false` if it was
    /// already confirmed.
    pub fn confirm_task(&self, user_id: i64, store: &str, task_id: i64) -> AppResult<bool> {
        self.with_store(user_id, store, |conn| {
            let tx = conn.unchecked_transaction()?;
            let changed = queries::confirm_task(&tx, task_id)?.ok_or_else(|| {
                AppError::TaskNotFound {
                    store: store.to_string(),
                    id: task_id,
                }
            })?;
            if changed {
                ttlog(&tx, "confirm_task", store, &format!("Task {} confirmed", task_id))?;
            }
            tx.commit()?;
            Ok(changed)
        })
    }
}

impl ReminderSource for Registry {
    fn users(&self) -> AppResult<Vec<i64>> {
        self.list_users()
    }

    fn stores(&self, user_id: i64) -> AppResult<Vec<String>> {
        Ok(self.list_stores(user_id)?.into_iter().collect())
    }

    fn due_tasks(&self, user_id: i64, store: &str, now: DateTime<Utc>) -> AppResult<Vec<Task>> {
        self.with_store(user_id, store, |conn| queries::load_due_tasks(conn, &now))
    }

    fn mark_notified(
        &self,
        user_id: i64,
        store: &str,
        task_id: i64,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.with_store(user_id, store, |conn| {
            queries::mark_notified(conn, task_id, &at)?;
            Ok(())
        })
    }
}
