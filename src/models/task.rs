use crate::models::task_state::TaskState;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// One row of the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub confirmed: bool,
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(text: &str, created_at: DateTime<Utc>, due_at: DateTime<Utc>) -> Self {
        Self {
            id: 0, // assigned by SQLite
            text: text.to_string(),
            created_at,
            due_at,
            confirmed: false,
            last_notified_at: None,
        }
    }

    /// Unconfirmed and `due_at` reached.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.confirmed && self.due_at <= now
    }

    /// Due, and either never notified or the repeat interval has elapsed.
    pub fn needs_notification(&self, now: DateTime<Utc>, repeat: Duration) -> bool {
        if !self.is_due(now) {
            return false;
        }
        match self.last_notified_at {
            None => true,
            Some(last) => now - last >= repeat,
        }
    }

    pub fn state(&self, now: DateTime<Utc>) -> TaskState {
        if self.confirmed {
            TaskState::Confirmed
        } else if self.due_at > now {
            TaskState::Pending
        } else if self.last_notified_at.is_some() {
            TaskState::Notified
        } else {
            TaskState::Due
        }
    }
}
