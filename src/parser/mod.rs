//! HTML and feed parsing
//!
//! This module turns fetched pages and feed documents into [`Article`]s:
//! feed discovery and parsing live in [`feed`], the multi-strategy HTML
//! extractor in [`extract`].
//!
//! [`Article`]: crate::models::Article

pub mod extract;
pub mod feed;
pub mod jsonld;
pub mod sanitize;
pub mod selectors;

pub use extract::{ArticleSet, ContentExtractor, Strategy};
pub use feed::{discover_feeds, parse_feed, FeedParser};
