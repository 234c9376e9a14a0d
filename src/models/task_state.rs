use serde::Serialize;

/// Lifecycle of a task as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskState {
    Pending,   // due in the future
    Due,       // due reached, never notified
    Notified,  // reminder sent, awaiting confirm
    Confirmed, // terminal
}

impl TaskState {
    pub fn icon(&self) -> &str {
        match self {
            TaskState::Pending => "🕒",
            TaskState::Due => "⏰",
            TaskState::Notified => "🔔",
            TaskState::Confirmed => "✅",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Due => "due",
            TaskState::Notified => "waiting for confirmation",
            TaskState::Confirmed => "done",
        }
    }
}
