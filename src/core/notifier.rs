use crate::errors::AppResult;
use crate::models::Task;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A reminder about to be delivered to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub store: String,
    pub task_id: i64,
    pub text: String,
    pub due_at: DateTime<Utc>,
    /// Callback payload bound to `(store, task_id)` that confirms the task.
    pub confirm_token: String,
}

impl Reminder {
    pub fn for_task(store: &str, task: &Task) -> Self {
        Self {
            store: store.to_string(),
            task_id: task.id,
            text: task.text.clone(),
            due_at: task.due_at,
            confirm_token: confirm_token(store, task.id),
        }
    }
}

pub fn confirm_token(store: &str, task_id: i64) -> String {
    format!("ok:{}:{}", store, task_id)
}

/// Outbound channel for reminders (the chat transport in production).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one reminder. An `Err` means the user did not get it and the
    /// task must stay eligible for the next scan.
    async fn send_reminder(&self, user_id: i64, reminder: &Reminder) -> AppResult<()>;
}
