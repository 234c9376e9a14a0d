//! Telegram transport: long-polling update loop, command layer, notifier.

pub mod api;
pub mod commands;
pub mod format;
pub mod handlers;
pub mod keyboard;
pub mod notifier;
pub mod types;

use crate::bot::api::TelegramApi;
use crate::bot::handlers::Handler;
use crate::bot::types::Update;
use crate::core::clock::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Pause after a failed `getUpdates` before polling again.
const RETRY_DELAY: Duration = Duration::from_secs(5);

async fn dispatch<C: Clock + 'static>(api: &TelegramApi, handler: &Arc<Handler<C>>, update: Update) {
    if let Some(message) = update.message {
        let chat_id = message.chat.id;
        let Some(text) = message.text else {
            return;
        };
        debug!(chat_id, "message received");

        // Handlers hit SQLite and block on per-list locks.
        let h = handler.clone();
        let replies = match tokio::task::spawn_blocking(move || h.handle_text(chat_id, &text)).await
        {
            Ok(replies) => replies,
            Err(e) => {
                warn!(chat_id, error = %e, "message handler failed");
                return;
            }
        };

        for reply in replies {
            if let Err(e) = api
                .send_message(chat_id, &reply.text, reply.markup.as_ref())
                .await
            {
                warn!(chat_id, error = %e, "cannot send reply");
            }
        }
        return;
    }

    if let Some(query) = update.callback_query {
        let chat_id = query
            .message
            .as_ref()
            .map(|m| m.chat.id)
            .unwrap_or(query.from.id);
        let data = query.data.clone().unwrap_or_default();

        let h = handler.clone();
        let outcome =
            match tokio::task::spawn_blocking(move || h.handle_callback(chat_id, &data)).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(chat_id, error = %e, "callback handler failed");
                    return;
                }
            };

        if let Err(e) = api
            .answer_callback_query(&query.id, Some(&outcome.toast))
            .await
        {
            warn!(chat_id, error = %e, "cannot answer callback");
        }

        if let (Some(text), Some(message)) = (outcome.edit, query.message.as_ref())
            && let Err(e) = api
                .edit_message_text(chat_id, message.message_id, &text)
                .await
        {
            warn!(chat_id, error = %e, "cannot edit message");
        }
    }
}

/// Poll for updates until `shutdown` flips to true.
pub async fn run_polling<C: Clock + 'static>(
    api: Arc<TelegramApi>,
    handler: Arc<Handler<C>>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("telegram polling started");
    let mut offset = 0i64;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let updates = tokio::select! {
            res = api.get_updates(offset) => res,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        };

        match updates {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    dispatch(&api, &handler, update).await;
                }
            }
            Err(e) => {
                warn!(error = %e, "getUpdates failed");
                tokio::select! {
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                    _ = shutdown.changed() => {}
                }
            }
        }
    }

    info!("telegram polling stopped");
}
