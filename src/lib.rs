//! habr-relay library
//!
//! Fetches the Habr information-security feed, drops articles that were
//! already delivered within the retention window, and hands the rest to
//! Telegram chats and the `/api/articles` endpoint.

pub mod api;
pub mod cache;
pub mod config;
pub mod delivery;
pub mod feed;
pub mod limiter;
pub mod pipeline;
pub mod telegram;
pub mod util;
