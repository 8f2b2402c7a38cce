//! Feed retrieval for the single configured RSS/Atom source.
//!
//! - [`parser`] - Low-level feed parsing using the `feed-rs` crate
//! - [`fetcher`] - HTTP fetching with a timeout and a response size cap
//!
//! # Example
//!
//! ```ignore
//! use habr_relay::feed::FeedFetcher;
//!
//! let fetcher = FeedFetcher::new(reqwest::Client::new(), feed_url);
//! let entries = fetcher.fetch().await?;
//! ```

mod fetcher;
mod parser;

pub use fetcher::{FeedFetcher, FetchError, DEFAULT_FETCH_TIMEOUT};
pub use parser::{parse_feed, FeedEntry};
