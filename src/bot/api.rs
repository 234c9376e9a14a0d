use crate::bot::types::{
    AnswerCallbackQuery, ApiResponse, EditMessageText, GetUpdates, Message, ReplyMarkup,
    SendMessage, Update,
};
use crate::errors::{AppError, AppResult};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Thin client for the Telegram Bot HTTP API.
pub struct TelegramApi {
    client: Client,
    base_url: String,
    token: String,
    poll_timeout: u64,
}

impl TelegramApi {
    pub fn new(base_url: &str, token: &str, poll_timeout: u64) -> AppResult<Self> {
        if token.trim().is_empty() {
            return Err(AppError::Config(
                "bot_token is empty (set it in the config file or RREMINDER_BOT_TOKEN)".into(),
            ));
        }

        // Long polling holds the request open for `poll_timeout` seconds.
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout + 15))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
            poll_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<P, T>(&self, method: &str, payload: &P) -> AppResult<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body: ApiResponse<T> = response.json().await?;

        if !body.ok {
            return Err(AppError::Telegram(format!(
                "{} returned {}: {}",
                method,
                status,
                body.description.unwrap_or_else(|| "no description".into())
            )));
        }

        body.result
            .ok_or_else(|| AppError::Telegram(format!("{} returned no result", method)))
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> AppResult<Vec<Update>> {
        let payload = GetUpdates {
            offset,
            timeout: self.poll_timeout,
            allowed_updates: &["message", "callback_query"],
        };
        self.call("getUpdates", &payload).await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<&ReplyMarkup>,
    ) -> AppResult<Message> {
        let payload = SendMessage {
            chat_id,
            text,
            reply_markup: markup,
        };
        self.call("sendMessage", &payload).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> AppResult<()> {
        let payload = EditMessageText {
            chat_id,
            message_id,
            text,
        };
        // Result is the edited Message (or `true` for inline messages).
        let _: serde_json::Value = self.call("editMessageText", &payload).await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, id: &str, text: Option<&str>) -> AppResult<()> {
        let payload = AnswerCallbackQuery {
            callback_query_id: id,
            text,
        };
        let _: bool = self.call("answerCallbackQuery", &payload).await?;
        Ok(())
    }
}
