//! "Get me articles for this site"
//!
//! Stages, each tried only when the previous one produced nothing:
//!
//! 1. Feeds advertised by the site's home page
//! 2. HTML extraction on the requested page
//! 3. Well-known fallback feeds, independent of the site
//!
//! Stage failures are logged and absorbed; the worst case is an empty list.
//! Only a disallowed or malformed site is reported as an error, before any
//! request is made.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::allowlist::HostAllowlist;
use super::fetcher::Fetcher;
use super::session::SessionState;
use crate::config::Config;
use crate::error::Result;
use crate::models::Article;
use crate::parser::{discover_feeds, ContentExtractor, FeedParser};
use crate::utils::error::FetchError;
use crate::utils::origin_url;

/// Anything that can produce the article list for a site
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Articles for `site`; errors only on validation failures
    async fn fetch_articles(&self, site: &str) -> Result<Vec<Article>>;
}

/// Feed-first, HTML-second, fallback-feed-last scraper
pub struct NewsScraper {
    allowlist: Arc<HostAllowlist>,
    fetcher: Arc<Fetcher>,
    feeds: FeedParser,
    extractor: ContentExtractor,
    fallback_feeds: Vec<String>,
}

impl NewsScraper {
    pub fn new(
        allowlist: Arc<HostAllowlist>,
        fetcher: Arc<Fetcher>,
        extractor: ContentExtractor,
        fallback_feeds: Vec<String>,
    ) -> Self {
        Self {
            allowlist,
            feeds: FeedParser::new(Arc::clone(&fetcher)),
            fetcher,
            extractor,
            fallback_feeds,
        }
    }

    /// Build the whole fetch stack from configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` if the HTTP client cannot be created
    pub fn from_config(
        config: &Config,
        session: Arc<SessionState>,
    ) -> std::result::Result<Self, FetchError> {
        let allowlist = Arc::new(HostAllowlist::from_csv(
            &config.allowlist.sites,
            config.allowlist.match_mode,
        ));
        let fetcher = Arc::new(Fetcher::new(&config.fetcher, session)?);

        Ok(Self::new(
            allowlist,
            fetcher,
            ContentExtractor::default(),
            config.refresh.fallback_feeds.clone(),
        ))
    }

    pub fn allowlist(&self) -> &Arc<HostAllowlist> {
        &self.allowlist
    }

    pub fn fetcher(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    /// Run the stages for an allowed site
    pub async fn fetch_articles(&self, site: &str) -> Result<Vec<Article>> {
        self.allowlist.check(site)?;

        let home = origin_url(site).unwrap_or_else(|| site.to_string());

        let (articles, home_body) = self.from_discovered_feeds(&home).await;
        if !articles.is_empty() {
            info!(site, count = articles.len(), stage = "feeds", "Articles found");
            return Ok(articles);
        }

        let reuse = home_body.filter(|_| same_page(site, &home));
        let articles = self.from_page(site, reuse).await;
        if !articles.is_empty() {
            info!(site, count = articles.len(), stage = "html", "Articles found");
            return Ok(articles);
        }

        let articles = self.from_fallback_feeds().await;
        if !articles.is_empty() {
            info!(site, count = articles.len(), stage = "fallback_feeds", "Articles found");
            return Ok(articles);
        }

        warn!(site, "No articles found by any stage");
        Ok(Vec::new())
    }

    /// Stage 1; also hands back the home page body when it was fetched
    async fn from_discovered_feeds(&self, home: &str) -> (Vec<Article>, Option<String>) {
        let body = match self.fetcher.fetch(home).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = home, error = %e, "Home page fetch failed");
                return (Vec::new(), None);
            }
        };

        let mut seen = HashSet::new();
        let feeds: Vec<String> = discover_feeds(&body, home)
            .filter(|feed| seen.insert(feed.to_lowercase()))
            .collect();
        debug!(url = home, count = feeds.len(), "Feeds discovered");

        for feed in &feeds {
            let articles = self.feeds.parse(feed).await;
            if !articles.is_empty() {
                return (articles, Some(body));
            }
        }

        (Vec::new(), Some(body))
    }

    /// Stage 2
    async fn from_page(&self, site: &str, prefetched: Option<String>) -> Vec<Article> {
        let body = match prefetched {
            Some(body) => body,
            None => match self.fetcher.fetch(site).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(url = site, error = %e, "Page fetch failed");
                    return Vec::new();
                }
            },
        };

        self.extractor.extract(&body, site)
    }

    /// Stage 3
    async fn from_fallback_feeds(&self) -> Vec<Article> {
        for feed in &self.fallback_feeds {
            let articles = self.feeds.parse(feed).await;
            if !articles.is_empty() {
                return articles;
            }
        }
        Vec::new()
    }
}

#[async_trait]
impl ArticleSource for NewsScraper {
    async fn fetch_articles(&self, site: &str) -> Result<Vec<Article>> {
        NewsScraper::fetch_articles(self, site).await
    }
}

/// Whether two URLs name the same page (`https://x` and `https://x/` do)
fn same_page(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CookieConfig, FetcherConfig};
    use crate::crawler::allowlist::MatchMode;
    use crate::error::Error;

    fn scraper() -> NewsScraper {
        let session = Arc::new(SessionState::from_config(&CookieConfig::default()));
        let fetcher = Arc::new(Fetcher::new(&FetcherConfig::default(), session).unwrap());
        NewsScraper::new(
            Arc::new(HostAllowlist::from_csv("noticias.uol.com.br", MatchMode::DotBoundary)),
            fetcher,
            ContentExtractor::default(),
            Vec::new(),
        )
    }

    #[test]
    fn test_same_page() {
        assert!(same_page("https://site.test", "https://site.test/"));
        assert!(!same_page("https://site.test/politica", "https://site.test/"));
        assert!(!same_page("nope", "https://site.test/"));
    }

    #[tokio::test]
    async fn test_disallowed_site_is_rejected() {
        let result = scraper().fetch_articles("http://evil.example/").await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_malformed_site_is_rejected() {
        let result = scraper().fetch_articles("not a url").await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
