//! Parsing of chat commands and inline-button payloads.

use crate::core::notifier::confirm_token;
use crate::errors::{AppError, AppResult};

pub const BUTTON_LISTS: &str = "📋 My lists";
pub const BUTTON_DUE: &str = "⏰ Due now";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    NewList(Option<String>),
    DelList,
    Lists,
    AddTask(String),
    Tasks(Option<String>),
    DelTask(Option<String>),
    DueNow,
    Unknown(String),
}

impl Command {
    /// Parse a text message. Returns `None` for plain text that is neither a
    /// `/command` nor a reply-keyboard button.
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();

        match text {
            BUTTON_LISTS => return Some(Command::Lists),
            BUTTON_DUE => return Some(Command::DueNow),
            _ => {}
        }

        let rest = text.strip_prefix('/')?;
        let (head, arg) = match rest.split_once(char::is_whitespace) {
            Some((h, a)) => (h, a.trim()),
            None => (rest, ""),
        };
        // "/cmd@my_bot" in group chats
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
        let arg = (!arg.is_empty()).then(|| arg.to_string());

        let cmd = match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "newlist" => Command::NewList(arg),
            "dellist" => Command::DelList,
            "lists" => Command::Lists,
            "addtask" => Command::AddTask(arg.unwrap_or_default()),
            "tasks" => Command::Tasks(arg),
            "deltask" => Command::DelTask(arg),
            "due" => Command::DueNow,
            other => Command::Unknown(other.to_string()),
        };
        Some(cmd)
    }
}

/// `store:text:day:hh:mm`, with an empty `day` meaning today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTaskRequest {
    pub store: String,
    pub text: String,
    pub day: Option<u32>,
    pub hour: u32,
    pub minute: u32,
}

pub const ADD_TASK_USAGE: &str = "Format: /addtask list:task:day:hh:mm\n\
     Example: /addtask tasks1:wakeup:1:8:45\n\
     Or: /addtask tasks1:wakeup::8:45 (day = today)";

impl AddTaskRequest {
    /// Fields are split from the right, so the task text may contain `:`.
    pub fn parse(arg: &str) -> AppResult<Self> {
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(AppError::InvalidCommand(ADD_TASK_USAGE.into()));
        }

        let mut right = arg.rsplitn(4, ':');
        let minute = right.next();
        let hour = right.next();
        let day = right.next();
        let head = right.next();

        let (Some(minute), Some(hour), Some(day), Some(head)) = (minute, hour, day, head) else {
            return Err(AppError::InvalidCommand(format!(
                "not enough fields\n{}",
                ADD_TASK_USAGE
            )));
        };

        let Some((store, text)) = head.split_once(':') else {
            return Err(AppError::InvalidCommand(format!(
                "not enough fields\n{}",
                ADD_TASK_USAGE
            )));
        };

        let hour = parse_number(hour, "hours")?;
        let minute = parse_number(minute, "minutes")?;
        if hour > 23 || minute > 59 {
            return Err(AppError::InvalidTime(format!(
                "{}:{} (hours 0-23, minutes 0-59)",
                hour, minute
            )));
        }

        let day = match day.trim() {
            "" => None,
            d => {
                let d: u32 = d
                    .parse()
                    .map_err(|_| AppError::InvalidDate(format!("day must be 1-31 or empty, got '{}'", d)))?;
                if !(1..=31).contains(&d) {
                    return Err(AppError::InvalidDate(format!("day must be 1-31, got {}", d)));
                }
                Some(d)
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::EmptyText);
        }

        Ok(Self {
            store: store.trim().to_string(),
            text: text.to_string(),
            day,
            hour,
            minute,
        })
    }
}

fn parse_number(raw: &str, what: &str) -> AppResult<u32> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidTime(format!("{} must be a number, got '{}'", what, raw)));
    }
    raw.parse()
        .map_err(|_| AppError::InvalidTime(format!("{} out of range: '{}'", what, raw)))
}

/// Payload carried by inline keyboard buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    DeleteStore(String),
    DeleteTask { store: String, task_id: i64 },
    Confirm { store: String, task_id: i64 },
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::DeleteStore(store) => format!("dl:{}", store),
            CallbackAction::DeleteTask { store, task_id } => format!("dt:{}:{}", store, task_id),
            CallbackAction::Confirm { store, task_id } => confirm_token(store, *task_id),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let (kind, rest) = data.split_once(':')?;
        match kind {
            "dl" if !rest.is_empty() && !rest.contains(':') => {
                Some(CallbackAction::DeleteStore(rest.to_string()))
            }
            "dt" | "ok" => {
                let (store, id) = rest.rsplit_once(':')?;
                if store.is_empty() {
                    return None;
                }
                let task_id = id.parse().ok()?;
                let store = store.to_string();
                Some(if kind == "dt" {
                    CallbackAction::DeleteTask { store, task_id }
                } else {
                    CallbackAction::Confirm { store, task_id }
                })
            }
            _ => None,
        }
    }
}
