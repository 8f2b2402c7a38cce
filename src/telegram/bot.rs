use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::delivery::{ChatId, Courier, DeliveryError, MessageId, Messenger};
use crate::telegram::{ParseMode, TelegramClient};

/// How long one getUpdates call may block on the server.
pub const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// Pause before polling again after a failed getUpdates call.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId, DeliveryError> {
        let msg = self.send_message(chat_id.0, text, None).await?;
        Ok(MessageId(msg.message_id))
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageId, DeliveryError> {
        let msg = self
            .send_message(chat_id.0, html, Some(ParseMode::Html))
            .await?;
        Ok(MessageId(msg.message_id))
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError> {
        TelegramClient::delete_message(self, chat_id.0, message_id.0).await?;
        Ok(())
    }
}

/// Long-polls Telegram and hands every message to the courier.
///
/// Each message is processed on its own task, so a slow feed fetch for one
/// chat never holds up the update loop. Polling errors are logged and
/// retried after a short pause; the loop only ends with the runtime.
pub async fn run_polling(client: Arc<TelegramClient>, courier: Arc<Courier>) {
    let mut offset = 0;

    loop {
        let updates = match client.get_updates(offset, LONG_POLL_TIMEOUT).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to poll Telegram updates");
                tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };

            let courier = Arc::clone(&courier);
            tokio::spawn(async move {
                let chat_id = ChatId(message.chat.id);
                let text = message.text.as_deref().unwrap_or_default().trim();
                courier.handle_message(chat_id, text).await;
            });
        }
    }
}
