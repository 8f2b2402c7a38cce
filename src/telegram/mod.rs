//! Telegram Bot API transport.
//!
//! A thin `reqwest` client for the handful of Bot API methods the relay
//! needs, the [`Messenger`](crate::delivery::Messenger) implementation on
//! top of it, and the long-polling update loop.

mod bot;
mod client;
mod error;

pub use bot::{run_polling, LONG_POLL_TIMEOUT};
pub use client::{Chat, Message, ParseMode, TelegramClient, Update, User, DEFAULT_API_BASE};
pub use error::TelegramError;
