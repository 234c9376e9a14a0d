//! Human readable texts sent to the chat.

use crate::core::notifier::Reminder;
use crate::errors::AppError;
use crate::models::Task;
use crate::utils::time::format_local;
use chrono::{DateTime, FixedOffset, Utc};

/// `sendMessage` text limit, counted in UTF-16 code units.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Split `text` into messages of at most `max` UTF-16 units, breaking at line
/// ends. A single line longer than `max` is cut between characters.
pub fn split_message(text: &str, max: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len: usize = line.encode_utf16().count();

        if current_len + line_len > max && !current.is_empty() {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= max {
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        for ch in line.chars() {
            let ch_len = ch.len_utf16();
            if current_len + ch_len > max {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push(ch);
            current_len += ch_len;
        }
    }

    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

pub fn welcome(max_stores: usize) -> String {
    format!(
        "🔹 Reminder bot\n\
         Lists per user: up to {max_stores}\n\n\
         /newlist <name> – create a task list\n\
         /dellist – delete a task list\n\
         /lists – show your lists\n\
         /addtask list:task:day:hh:mm – add a task\n\
         /tasks <list> – show the tasks of a list\n\
         /deltask <list> – delete a task\n\
         /due – tasks waiting for confirmation\n\n\
         At the due time you get a reminder every 2 minutes until you press ✅ Done."
    )
}

pub fn store_list(stores: &[String], max_stores: usize) -> String {
    if stores.is_empty() {
        return "You have no lists yet. Create one with /newlist <name>.".to_string();
    }
    let mut out = format!("📚 Your lists ({}/{}):\n", stores.len(), max_stores);
    for s in stores {
        out.push_str(&format!("• {}\n", s));
    }
    out
}

pub fn task_list(store: &str, tasks: &[Task], now: DateTime<Utc>, tz: &FixedOffset) -> String {
    if tasks.is_empty() {
        return format!("📋 List {} is empty.", store);
    }

    let mut out = format!("📋 Tasks in {}:\n", store);
    for t in tasks {
        let state = t.state(now);
        out.push_str(&format!(
            "\n🔹 ID: {}\n📌 Task: {}\n🕒 Created: {}\n⏰ Due: {}\n{} Status: {}\n",
            t.id,
            t.text,
            format_local(&t.created_at, tz),
            format_local(&t.due_at, tz),
            state.icon(),
            state.label()
        ));
    }
    out
}

pub fn task_button_label(task: &Task, tz: &FixedOffset) -> String {
    format!("❌ {}: {} ({})", task.id, task.text, format_local(&task.due_at, tz))
}

pub fn reminder(reminder: &Reminder, tz: &FixedOffset) -> String {
    format!(
        "⏰ Reminder\n📌 Task: {}\n🕒 Due: {}\n📋 List: {}",
        reminder.text,
        format_local(&reminder.due_at, tz),
        reminder.store
    )
}

pub fn confirmed(text: &str, store: &str) -> String {
    format!("✅ Done: {} (list {})", text, store)
}

/// Explicit reason for a rejected command.
pub fn rejection(err: &AppError) -> String {
    match err {
        AppError::InvalidName(name) => format!(
            "❌ Invalid list name '{}': use only latin letters, digits and _ (max {} chars).",
            name,
            crate::models::store_name::MAX_NAME_LEN
        ),
        AppError::AlreadyExists(name) => format!("❌ List {} already exists!", name),
        AppError::StoreNotFound(name) => format!("❌ List {} does not exist!", name),
        AppError::TaskNotFound { store, id } => {
            format!("❌ Task {} not found in list {}.", id, store)
        }
        AppError::QuotaExceeded(max) => {
            format!("❌ Limit reached: at most {} lists per user.", max)
        }
        AppError::EmptyText => "❌ Task text cannot be empty!".to_string(),
        AppError::InvalidCommand(msg) => format!("❌ Invalid command: {}", msg),
        AppError::InvalidDate(msg) => format!("❌ Invalid date: {}", msg),
        AppError::InvalidTime(msg) => format!("❌ Invalid time: {}", msg),
        _ => "❌ Something went wrong, please try again later.".to_string(),
    }
}
