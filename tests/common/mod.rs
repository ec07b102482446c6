//! Common test utilities

use std::path::Path;
use std::sync::Arc;

use manchete::config::{CookieConfig, FetcherConfig};
use manchete::crawler::{Fetcher, SessionState};
use manchete::utils::retry::RetryPolicy;

/// Session whose cookie files live in `dir` and track the given roots
pub fn session_in(dir: &Path, roots: &[String]) -> Arc<SessionState> {
    Arc::new(SessionState::from_config(&CookieConfig {
        store_dir: dir.to_path_buf(),
        root_domains: roots.to_vec(),
        seed: None,
    }))
}

/// Fetcher with the default configuration and no waiting between attempts
pub fn fetcher_with(session: Arc<SessionState>) -> Fetcher {
    Fetcher::new(&FetcherConfig::default(), session)
        .unwrap()
        .with_retry_policy(RetryPolicy::immediate(3))
}

/// RSS 2.0 document with one item per `(title, link)`
#[allow(dead_code)]
pub fn rss(items: &[(&str, &str)]) -> String {
    let body: String = items
        .iter()
        .map(|(title, link)| {
            format!(
                "<item><title>{title}</title><link>{link}</link>\
                 <description>Resumo de {title}</description>\
                 <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate></item>"
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test feed</title><link>http://feed.test/</link>
<description>Test</description>{body}</channel></rss>"#
    )
}

/// Home page advertising one RSS feed
#[allow(dead_code)]
pub fn page_with_feed(feed_href: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head>
<link rel="alternate" type="application/rss+xml" title="RSS" href="{feed_href}">
</head><body><p>Home</p></body></html>"#
    )
}
