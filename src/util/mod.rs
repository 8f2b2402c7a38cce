//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **Text processing**: summary normalization, character-bounded truncation,
//!   and HTML escaping for chat delivery
//! - **URL validation**: shape checks for the configured feed source
//!
//! # Examples
//!
//! ```
//! use habr_relay::util::{escape_html, normalize_summary, validate_feed_url};
//!
//! let summary = normalize_summary("<p>Patch <strong>now</strong></p>");
//! assert_eq!(summary, "Patch now");
//!
//! assert_eq!(escape_html("a < b"), "a &lt; b");
//! assert!(validate_feed_url("https://habr.com/rss").is_ok());
//! ```

mod text;
mod url_validator;

pub use text::{escape_html, normalize_summary, truncate_chars, SUMMARY_MAX_CHARS};
pub use url_validator::{validate_feed_url, UrlValidationError};
