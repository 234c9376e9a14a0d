//! Command layer: turns chat input into registry operations and replies.
//!
//! Handlers are synchronous and return what should be sent; the polling loop
//! in [`crate::bot`] performs the HTTP calls.

use crate::bot::commands::{AddTaskRequest, CallbackAction, Command};
use crate::bot::format;
use crate::bot::keyboard;
use crate::bot::types::ReplyMarkup;
use crate::core::clock::Clock;
use crate::db::registry::Registry;
use crate::errors::{AppError, AppResult};
use crate::models::TaskState;
use crate::utils::time::resolve_due;
use chrono::FixedOffset;
use dashmap::DashSet;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub markup: Option<ReplyMarkup>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: None,
        }
    }

    pub fn with_markup(text: impl Into<String>, markup: ReplyMarkup) -> Self {
        Self {
            text: text.into(),
            markup: Some(markup),
        }
    }
}

/// Answer to an inline button press: a toast, and optionally new text for
/// the message that carried the button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub toast: String,
    pub edit: Option<String>,
}

pub struct Handler<C> {
    registry: Arc<Registry>,
    clock: Arc<C>,
    tz: FixedOffset,
    /// Chats whose next plain message is the name for `/newlist`.
    awaiting_name: DashSet<i64>,
}

/// Plain text reply, split when it is over the message size limit.
fn long_text(text: String) -> Vec<Reply> {
    format::split_message(&text, format::MAX_MESSAGE_LEN)
        .into_iter()
        .map(Reply::text)
        .collect()
}

fn rejected(err: AppError) -> Vec<Reply> {
    if !is_user_error(&err) {
        warn!(error = %err, "command failed");
    }
    vec![Reply::text(format::rejection(&err))]
}

fn is_user_error(err: &AppError) -> bool {
    matches!(
        err,
        AppError::InvalidName(_)
            | AppError::AlreadyExists(_)
            | AppError::StoreNotFound(_)
            | AppError::TaskNotFound { .. }
            | AppError::QuotaExceeded(_)
            | AppError::EmptyText
            | AppError::InvalidCommand(_)
            | AppError::InvalidDate(_)
            | AppError::InvalidTime(_)
    )
}

impl<C: Clock> Handler<C> {
    pub fn new(registry: Arc<Registry>, clock: Arc<C>, tz: FixedOffset) -> Self {
        Self {
            registry,
            clock,
            tz,
            awaiting_name: DashSet::new(),
        }
    }

    pub fn is_awaiting_name(&self, chat_id: i64) -> bool {
        self.awaiting_name.contains(&chat_id)
    }

    /// Handle a text message from `chat_id`.
    pub fn handle_text(&self, chat_id: i64, text: &str) -> Vec<Reply> {
        let Some(cmd) = Command::parse(text) else {
            if self.awaiting_name.remove(&chat_id).is_some() {
                return self.create_list(chat_id, text);
            }
            return vec![Reply::text("Send /help to see the available commands.")];
        };

        self.awaiting_name.remove(&chat_id);

        match cmd {
            Command::Start | Command::Help => self.start(chat_id),
            Command::NewList(Some(name)) => self.create_list(chat_id, &name),
            Command::NewList(None) => self.ask_list_name(chat_id),
            Command::DelList => self.choose_list_to_delete(chat_id),
            Command::Lists => self.show_lists(chat_id),
            Command::AddTask(arg) => self.add_task(chat_id, &arg),
            Command::Tasks(Some(store)) => self.show_tasks(chat_id, &store),
            Command::Tasks(None) => vec![Reply::text("❌ Specify a list!\nExample: /tasks tasks1")],
            Command::DelTask(Some(store)) => self.choose_task_to_delete(chat_id, &store),
            Command::DelTask(None) => {
                vec![Reply::text("❌ Specify a list!\nExample: /deltask tasks1")]
            }
            Command::DueNow => self.show_due(chat_id),
            Command::Unknown(name) => vec![Reply::text(format!(
                "❓ Unknown command /{}. Send /help.",
                name
            ))],
        }
    }

    /// Handle an inline button press from `chat_id`.
    pub fn handle_callback(&self, chat_id: i64, data: &str) -> CallbackOutcome {
        let Some(action) = CallbackAction::parse(data) else {
            return CallbackOutcome {
                toast: "❌ Unknown action".to_string(),
                edit: None,
            };
        };

        let result = match &action {
            CallbackAction::DeleteStore(store) => self
                .registry
                .delete_store(chat_id, store)
                .map(|_| CallbackOutcome {
                    toast: format!("✅ {} deleted!", store),
                    edit: Some(format!("🗑 List {} deleted.", store)),
                }),
            CallbackAction::DeleteTask { store, task_id } => self
                .registry
                .delete_task(chat_id, store, *task_id)
                .map(|_| CallbackOutcome {
                    toast: "✅ Task deleted!".to_string(),
                    edit: Some(format!("🗑 Task {} deleted from {}.", task_id, store)),
                }),
            CallbackAction::Confirm { store, task_id } => {
                self.confirm(chat_id, store, *task_id)
            }
        };

        match result {
            Ok(outcome) => {
                info!(chat_id, action = %action.encode(), "callback handled");
                outcome
            }
            Err(e) => {
                if !is_user_error(&e) {
                    warn!(chat_id, error = %e, "callback failed");
                }
                CallbackOutcome {
                    toast: format::rejection(&e),
                    edit: None,
                }
            }
        }
    }

    fn confirm(&self, chat_id: i64, store: &str, task_id: i64) -> AppResult<CallbackOutcome> {
        let task = self.registry.get_task(chat_id, store, task_id)?;
        let changed = self.registry.confirm_task(chat_id, store, task_id)?;
        Ok(CallbackOutcome {
            toast: if changed {
                "✅ Confirmed!".to_string()
            } else {
                "Already confirmed".to_string()
            },
            edit: Some(format::confirmed(&task.text, store)),
        })
    }

    fn start(&self, chat_id: i64) -> Vec<Reply> {
        if let Err(e) = self.registry.ensure_namespace(chat_id) {
            return rejected(e);
        }
        vec![Reply::with_markup(
            format::welcome(self.registry.max_stores()),
            keyboard::main_menu(),
        )]
    }

    fn ask_list_name(&self, chat_id: i64) -> Vec<Reply> {
        match self.registry.can_create(chat_id) {
            Ok(true) => {}
            Ok(false) => return rejected(AppError::QuotaExceeded(self.registry.max_stores())),
            Err(e) => return rejected(e),
        }
        self.awaiting_name.insert(chat_id);
        vec![Reply::with_markup(
            "📝 Send the name of the new list (latin letters, digits and _):",
            keyboard::ask_name(),
        )]
    }

    fn create_list(&self, chat_id: i64, name: &str) -> Vec<Reply> {
        match self.registry.create_store(chat_id, name) {
            Ok(()) => vec![Reply::text(format!("✅ List {} created!", name.trim()))],
            Err(e) => rejected(e),
        }
    }

    fn stores_of(&self, chat_id: i64) -> AppResult<Vec<String>> {
        Ok(self.registry.list_stores(chat_id)?.into_iter().collect())
    }

    fn choose_list_to_delete(&self, chat_id: i64) -> Vec<Reply> {
        match self.stores_of(chat_id) {
            Ok(stores) if stores.is_empty() => {
                vec![Reply::text("❌ You have no lists to delete!")]
            }
            Ok(stores) => vec![Reply::with_markup(
                "🗑 Choose the list to delete:",
                keyboard::delete_stores(&stores),
            )],
            Err(e) => rejected(e),
        }
    }

    fn show_lists(&self, chat_id: i64) -> Vec<Reply> {
        match self.stores_of(chat_id) {
            Ok(stores) => vec![Reply::text(format::store_list(
                &stores,
                self.registry.max_stores(),
            ))],
            Err(e) => rejected(e),
        }
    }

    fn add_task(&self, chat_id: i64, arg: &str) -> Vec<Reply> {
        let now = self.clock.now();
        let result = AddTaskRequest::parse(arg).and_then(|req| {
            let due = resolve_due(now, &self.tz, req.day, req.hour, req.minute)?;
            let id = self.registry.add_task(chat_id, &req.store, &req.text, due)?;
            let tasks = self.registry.list_tasks(chat_id, &req.store)?;
            Ok((req.store, id, tasks))
        });

        match result {
            Ok((store, id, tasks)) => {
                let mut replies = vec![Reply::text(format!("✅ Task {} added to {}.", id, store))];
                replies.extend(long_text(format::task_list(&store, &tasks, now, &self.tz)));
                replies
            }
            Err(e) => rejected(e),
        }
    }

    fn show_tasks(&self, chat_id: i64, store: &str) -> Vec<Reply> {
        match self.registry.list_tasks(chat_id, store) {
            Ok(tasks) => long_text(format::task_list(store, &tasks, self.clock.now(), &self.tz)),
            Err(e) => rejected(e),
        }
    }

    fn choose_task_to_delete(&self, chat_id: i64, store: &str) -> Vec<Reply> {
        match self.registry.list_tasks(chat_id, store) {
            Ok(tasks) if tasks.is_empty() => {
                vec![Reply::text(format!("❌ List {} has no tasks to delete!", store))]
            }
            Ok(tasks) => vec![Reply::with_markup(
                "🗑 Choose the task to delete:",
                keyboard::delete_tasks(store, &tasks, &self.tz),
            )],
            Err(e) => rejected(e),
        }
    }

    fn show_due(&self, chat_id: i64) -> Vec<Reply> {
        let now = self.clock.now();
        let stores = match self.stores_of(chat_id) {
            Ok(s) => s,
            Err(e) => return rejected(e),
        };

        let mut out = String::new();
        for store in &stores {
            let tasks = match self.registry.list_tasks(chat_id, store) {
                Ok(t) => t,
                Err(e) => {
                    warn!(chat_id, store = %store, error = %e, "cannot read list");
                    continue;
                }
            };
            for t in tasks
                .iter()
                .filter(|t| matches!(t.state(now), TaskState::Due | TaskState::Notified))
            {
                out.push_str(&format!(
                    "• [{}] {} – {}\n",
                    store,
                    t.text,
                    crate::utils::time::format_local(&t.due_at, &self.tz)
                ));
            }
        }

        if out.is_empty() {
            vec![Reply::text("✅ Nothing is waiting for confirmation.")]
        } else {
            long_text(format!("⏰ Waiting for confirmation:\n{}", out))
        }
    }
}
