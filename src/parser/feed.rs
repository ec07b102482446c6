//! RSS/Atom feed discovery and parsing

use scraper::Html;
use std::sync::Arc;
use tracing::{debug, warn};

use super::sanitize::{clean_summary, clean_text};
use super::selectors::FEED_LINK;
use crate::crawler::fetcher::Fetcher;
use crate::models::{Article, MAX_FEED_ARTICLES};
use crate::utils::error::ParseError;
use crate::utils::resolve_url;

const FEED_TYPES: [&str; 2] = ["application/rss+xml", "application/atom+xml"];

/// Feed URLs advertised by a page, in document order
///
/// Yields every `<link rel="alternate">` with an RSS or Atom type, resolved
/// against `base_url`. Duplicates are kept; calling again restarts the scan.
///
/// # Examples
///
/// ```
/// use manchete::parser::feed::discover_feeds;
///
/// let html = r#"<link rel="alternate" type="application/rss+xml" href="/rss.xml">"#;
/// let feeds: Vec<String> = discover_feeds(html, "https://site.test/").collect();
/// assert_eq!(feeds, vec!["https://site.test/rss.xml"]);
/// ```
pub fn discover_feeds(html: &str, base_url: &str) -> impl Iterator<Item = String> {
    let doc = Html::parse_document(html);

    let feeds: Vec<String> = doc
        .select(&FEED_LINK)
        .filter(|link| {
            let attrs = link.value();
            let is_alternate = attrs.attr("rel").is_some_and(|rel| {
                rel.split_ascii_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("alternate"))
            });
            let is_feed = attrs.attr("type").is_some_and(|ty| {
                let ty = ty.trim();
                FEED_TYPES.iter().any(|feed| ty.eq_ignore_ascii_case(feed))
            });
            is_alternate && is_feed
        })
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| resolve_url(base_url, href))
        .collect();

    feeds.into_iter()
}

/// Parse an RSS or Atom document into at most 50 articles, in feed order
///
/// Entries without a title, or without a usable link, are skipped. The link
/// is the entry's first declared link, else its identifier when that is an
/// absolute URL.
///
/// # Errors
///
/// Returns `ParseError::Feed` when the document is not a feed
pub fn parse_feed(bytes: &[u8], feed_url: &str) -> Result<Vec<Article>, ParseError> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| ParseError::Feed {
        url: feed_url.to_string(),
        reason: e.to_string(),
    })?;

    let articles = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry
                .title
                .as_ref()
                .map(|t| clean_text(&t.content))
                .filter(|t| !t.is_empty())?;

            let url = entry
                .links
                .iter()
                .map(|link| link.href.trim())
                .find(|href| !href.is_empty())
                .and_then(|href| resolve_url(feed_url, href))
                .or_else(|| {
                    let id = entry.id.trim();
                    (id.starts_with("http://") || id.starts_with("https://"))
                        .then(|| resolve_url(feed_url, id))
                        .flatten()
                })?;

            let mut article = Article::new(title, url);
            if let Some(summary) = entry.summary.as_ref().and_then(|s| clean_summary(&s.content)) {
                article = article.with_description(summary);
            }
            if let Some(published) = entry.published.or(entry.updated) {
                article = article.with_published_at(published);
            }
            Some(article)
        })
        .take(MAX_FEED_ARTICLES)
        .collect();

    Ok(articles)
}

/// Downloads and parses feeds, absorbing every failure
#[derive(Clone)]
pub struct FeedParser {
    fetcher: Arc<Fetcher>,
}

impl FeedParser {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Articles of the feed at `feed_url`; empty on any network or parse failure
    pub async fn parse(&self, feed_url: &str) -> Vec<Article> {
        let bytes = match self.fetcher.fetch_feed(feed_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(url = feed_url, error = %e, "Feed download failed");
                return Vec::new();
            }
        };

        match parse_feed(&bytes, feed_url) {
            Ok(articles) => {
                debug!(url = feed_url, count = articles.len(), "Feed parsed");
                articles
            }
            Err(e) => {
                warn!(url = feed_url, error = %e, "Feed parse failed");
                Vec::new()
            }
        }
    }
}
