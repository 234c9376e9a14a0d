use crate::bot::commands::{BUTTON_DUE, BUTTON_LISTS, CallbackAction};
use crate::bot::format::task_button_label;
use crate::bot::types::{
    ForceReply, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup,
    ReplyMarkup,
};
use crate::core::notifier::Reminder;
use crate::models::Task;
use chrono::FixedOffset;

fn button(text: impl Into<String>, action: &CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton {
        text: text.into(),
        callback_data: action.encode(),
    }
}

/// Persistent shortcuts shown under the input field.
pub fn main_menu() -> ReplyMarkup {
    ReplyMarkup::Keyboard(ReplyKeyboardMarkup {
        keyboard: vec![vec![
            KeyboardButton {
                text: BUTTON_LISTS.to_string(),
            },
            KeyboardButton {
                text: BUTTON_DUE.to_string(),
            },
        ]],
        resize_keyboard: true,
    })
}

pub fn ask_name() -> ReplyMarkup {
    ReplyMarkup::ForceReply(ForceReply {
        force_reply: true,
        selective: true,
    })
}

/// One row per list; pressing deletes it.
pub fn delete_stores(stores: &[String]) -> ReplyMarkup {
    ReplyMarkup::Inline(InlineKeyboardMarkup {
        inline_keyboard: stores
            .iter()
            .map(|s| vec![button(format!("🗑 {}", s), &CallbackAction::DeleteStore(s.clone()))])
            .collect(),
    })
}

/// One row per task; pressing deletes it.
pub fn delete_tasks(store: &str, tasks: &[Task], tz: &FixedOffset) -> ReplyMarkup {
    ReplyMarkup::Inline(InlineKeyboardMarkup {
        inline_keyboard: tasks
            .iter()
            .map(|t| {
                vec![button(
                    task_button_label(t, tz),
                    &CallbackAction::DeleteTask {
                        store: store.to_string(),
                        task_id: t.id,
                    },
                )]
            })
            .collect(),
    })
}

/// The "✅ Done" button attached to every reminder.
pub fn confirm(reminder: &Reminder) -> ReplyMarkup {
    ReplyMarkup::Inline(InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton {
            text: "✅ Done".to_string(),
            callback_data: reminder.confirm_token.clone(),
        }]],
    })
}
