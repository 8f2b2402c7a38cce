//! Consumer-facing delivery of pipeline results.
//!
//! The chat transport lives behind [`Messenger`]; Telegram is the one
//! implementation shipped here. [`Courier`] owns the command handling, the
//! rate limit gate and the paced per-article sends, and never talks to a
//! transport directly.

use async_trait::async_trait;
use thiserror::Error;

mod courier;
pub mod messages;

pub use courier::{Command, Courier, DeliveryOutcome, DEFAULT_SEND_DELAY};
pub use messages::format_article;

/// Chat identifier as the transport knows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Message identifier, unique within one chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i64);

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),
}

/// Outbound side of a chat transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends plain text with no markup parsing.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId, DeliveryError>;

    /// Sends text in the transport's HTML dialect. Callers escape the content.
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageId, DeliveryError>;

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), DeliveryError>;
}
