use thiserror::Error;

use crate::delivery::DeliveryError;

/// Telegram Bot API errors
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed. The URL (which embeds the token) is stripped.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Telegram answered with `ok: false` or a non-success status
    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    /// Telegram answered `ok: true` without a result payload
    #[error("Telegram API response had no result")]
    MissingResult,
}

impl From<TelegramError> for DeliveryError {
    fn from(e: TelegramError) -> Self {
        DeliveryError::Transport(e.to_string())
    }
}
