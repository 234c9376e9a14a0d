use crate::bot::api::TelegramApi;
use crate::bot::format;
use crate::bot::keyboard;
use crate::core::notifier::{Notifier, Reminder};
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use chrono::FixedOffset;
use std::sync::Arc;

/// Delivers reminders as Telegram messages with a "✅ Done" button.
pub struct TelegramNotifier {
    api: Arc<TelegramApi>,
    tz: FixedOffset,
}

impl TelegramNotifier {
    pub fn new(api: Arc<TelegramApi>, tz: FixedOffset) -> Self {
        Self { api, tz }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_reminder(&self, user_id: i64, reminder: &Reminder) -> AppResult<()> {
        let text = format::reminder(reminder, &self.tz);
        let markup = keyboard::confirm(reminder);

        // The "Done" button rides on the last part.
        let parts = format::split_message(&text, format::MAX_MESSAGE_LEN);
        let last = parts.len() - 1;
        for (i, part) in parts.iter().enumerate() {
            let markup = (i == last).then_some(&markup);
            self.api
                .send_message(user_id, part, markup)
                .await
                .map_err(|e| AppError::Delivery(e.to_string()))?;
        }
        Ok(())
    }
}
