//! manchete - News headline extractor
//!
//! Collects the current headline list of allow-listed news sites. Feeds
//! advertised by a site are preferred; when none yield articles the page
//! HTML is mined with a chain of heuristics, and a fixed list of well-known
//! feeds is the last resort. A background refresher keeps a per-site
//! snapshot cache warm for an optional HTTP API.
//!
//! # Architecture
//!
//! - [`config`] - Configuration from environment variables and TOML files
//! - [`crawler`] - Allowlist, HTTP fetcher, cookie session and the scraper stages
//! - [`parser`] - Feed discovery and parsing, HTML extraction strategies
//! - [`cache`] - In-memory snapshot cache with TTL
//! - [`scheduler`] - Background cache refresher
//! - [`api`] - axum HTTP API
//! - [`models`] - Core data structures
//! - [`utils`] - Errors, retry policy and URL helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use manchete::config::Config;
//! use manchete::crawler::{NewsScraper, SessionState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let session = Arc::new(SessionState::from_config(&config.cookies));
//!     session.init(config.cookies.seed.as_deref()).await?;
//!
//!     let scraper = NewsScraper::from_config(&config, session)?;
//!     for article in scraper.fetch_articles("https://noticias.uol.com.br/").await? {
//!         println!("{} - {}", article.title, article.url);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod parser;
pub mod scheduler;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::SnapshotCache;
    pub use crate::config::Config;
    pub use crate::crawler::{ArticleSource, Fetcher, HostAllowlist, NewsScraper, SessionState};
    pub use crate::error::{Error, ErrorCategory, MancheteErrorTrait, Result};
    pub use crate::models::{Article, SiteSnapshot};
    pub use crate::parser::ContentExtractor;
    pub use crate::scheduler::CacheRefresher;
}

// Direct re-exports for convenience
pub use models::{Article, SiteSnapshot};
