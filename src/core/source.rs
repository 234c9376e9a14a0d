use crate::errors::AppResult;
use crate::models::Task;
use chrono::{DateTime, Utc};

/// What the scheduler needs from storage. Implemented by
/// [`crate::db::registry::Registry`]; tests plug in an in-memory fake.
pub trait ReminderSource: Send + Sync {
    fn users(&self) -> AppResult<Vec<i64>>;

    fn stores(&self, user_id: i64) -> AppResult<Vec<String>>;

    /// Unconfirmed tasks with `due_at <= now`.
    fn due_tasks(&self, user_id: i64, store: &str, now: DateTime<Utc>) -> AppResult<Vec<Task>>;

    fn mark_notified(
        &self,
        user_id: i64,
        store: &str,
        task_id: i64,
        at: DateTime<Utc>,
    ) -> AppResult<()>;
}
