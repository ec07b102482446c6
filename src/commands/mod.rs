pub mod cookies;
pub mod fetch;
pub mod refresh;
pub mod serve;

// Re-export command functions for convenience
pub use cookies::{allowed, cookies};
pub use fetch::fetch;
pub use refresh::refresh;
pub use serve::serve;

use anyhow::{Context, Result};
use std::sync::Arc;

use manchete::cache::SnapshotCache;
use manchete::config::Config;
use manchete::crawler::{NewsScraper, SessionState};

/// Everything a command needs to fetch and cache articles
pub struct Services {
    pub session: Arc<SessionState>,
    pub scraper: Arc<NewsScraper>,
    pub cache: Arc<SnapshotCache>,
}

impl Services {
    /// Load cookies, then build the fetch stack on top of the session
    pub async fn build(config: &Config) -> Result<Self> {
        let session = Arc::new(SessionState::from_config(&config.cookies));
        let loaded = session
            .init(config.cookies.seed.as_deref())
            .await
            .context("Failed to initialize cookie session")?;
        tracing::debug!(cookies = loaded, "Cookie session ready");

        let scraper = NewsScraper::from_config(config, Arc::clone(&session))
            .context("Failed to create HTTP client")?;

        Ok(Self {
            session,
            scraper: Arc::new(scraper),
            cache: Arc::new(SnapshotCache::new()),
        })
    }
}
