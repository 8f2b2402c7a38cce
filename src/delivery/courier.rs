use std::sync::Arc;
use std::time::Duration;

use crate::delivery::messages::{self, format_article};
use crate::delivery::{ChatId, MessageId, Messenger};
use crate::limiter::RateLimiter;
use crate::pipeline::Pipeline;

/// Pause after each delivered article, to stay under the transport's own limits.
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_millis(500);

/// Chat commands the relay understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Feed,
    Unknown,
}

impl Command {
    /// Parses the first word of a message.
    ///
    /// Telegram may send `/cmd@botname arg ...`; the bot suffix and any
    /// arguments are ignored.
    pub fn parse(text: &str) -> Self {
        let first = text.split_whitespace().next().unwrap_or("");
        let Some(name) = first.strip_prefix('/') else {
            return Self::Unknown;
        };
        let name = name.split('@').next().unwrap_or("").to_lowercase();

        match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "infosec" | "security" => Self::Feed,
            _ => Self::Unknown,
        }
    }
}

/// What happened to one feed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    FetchFailed,
    NothingNew,
    /// `failed` articles stay marked as sent; they are not retried.
    Delivered { sent: usize, failed: usize },
}

/// Runs chat-triggered cycles and hands the results to a [`Messenger`].
pub struct Courier {
    pipeline: Arc<Pipeline>,
    messenger: Arc<dyn Messenger>,
    limiter: Arc<RateLimiter>,
    send_delay: Duration,
}

impl Courier {
    pub fn new(
        pipeline: Arc<Pipeline>,
        messenger: Arc<dyn Messenger>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            pipeline,
            messenger,
            limiter,
            send_delay: DEFAULT_SEND_DELAY,
        }
    }

    pub fn with_send_delay(mut self, send_delay: Duration) -> Self {
        self.send_delay = send_delay;
        self
    }

    /// Handles one inbound chat message.
    ///
    /// Returns `None` when the rate limiter dropped the trigger; nothing is
    /// sent back in that case.
    pub async fn handle_message(&self, chat_id: ChatId, text: &str) -> Option<Command> {
        if !self.limiter.allow_chat(chat_id.0) {
            tracing::debug!(chat_id = chat_id.0, "Trigger dropped by rate limiter");
            return None;
        }

        let command = Command::parse(text);
        tracing::debug!(chat_id = chat_id.0, command = ?command, "Handling command");

        match command {
            Command::Start | Command::Unknown => {
                self.send_notice(chat_id, messages::WELCOME, "welcome").await
            }
            Command::Help => self.send_notice(chat_id, messages::HELP, "help").await,
            Command::Feed => {
                self.deliver_feed(chat_id).await;
            }
        }

        Some(command)
    }

    /// Runs one pipeline cycle and sends the new articles to `chat_id`.
    ///
    /// A transient "loading" message is shown while the feed is fetched and
    /// removed afterwards. Individual send failures are logged and skipped.
    pub async fn deliver_feed(&self, chat_id: ChatId) -> DeliveryOutcome {
        let loading = match self.messenger.send_text(chat_id, messages::LOADING).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(chat_id = chat_id.0, error = %e, "Failed to send loading message");
                None
            }
        };

        let articles = match self.pipeline.next_batch().await {
            Ok(articles) => {
                self.clear_loading(chat_id, loading).await;
                articles
            }
            Err(e) => {
                tracing::error!(chat_id = chat_id.0, error = %e, "Error getting feed");
                self.send_notice(chat_id, messages::FETCH_FAILED, "fetch failure")
                    .await;
                self.clear_loading(chat_id, loading).await;
                return DeliveryOutcome::FetchFailed;
            }
        };

        if articles.is_empty() {
            self.send_notice(chat_id, messages::NO_NEW_ARTICLES, "no new articles")
                .await;
            return DeliveryOutcome::NothingNew;
        }

        let mut sent = 0;
        let mut failed = 0;
        for article in &articles {
            match self
                .messenger
                .send_html(chat_id, &format_article(article))
                .await
            {
                Ok(_) => {
                    sent += 1;
                    tokio::time::sleep(self.send_delay).await;
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        chat_id = chat_id.0,
                        article = %article.id,
                        title = %article.title,
                        error = %e,
                        "Error sending article"
                    );
                }
            }
        }

        tracing::info!(chat_id = chat_id.0, sent, failed, "Feed delivered");
        DeliveryOutcome::Delivered { sent, failed }
    }

    async fn clear_loading(&self, chat_id: ChatId, loading: Option<MessageId>) {
        let Some(message_id) = loading else {
            return;
        };
        if let Err(e) = self.messenger.delete_message(chat_id, message_id).await {
            tracing::debug!(chat_id = chat_id.0, error = %e, "Failed to delete loading message");
        }
    }

    async fn send_notice(&self, chat_id: ChatId, text: &str, kind: &'static str) {
        if let Err(e) = self.messenger.send_text(chat_id, text).await {
            tracing::warn!(chat_id = chat_id.0, kind, error = %e, "Error sending message");
        }
    }
}
