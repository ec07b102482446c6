//! In-memory snapshot cache
//!
//! Holds the most recent [`SiteSnapshot`] per site under the key
//! `news::{site}`. Entries are replaced whole and expire after their TTL.
//!
//! # Example
//!
//! ```rust
//! use manchete::cache::SnapshotCache;
//! use manchete::models::{Article, SiteSnapshot};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let cache = SnapshotCache::new();
//! let site = "https://noticias.uol.com.br";
//! cache
//!     .publish(SiteSnapshot::new(site, vec![Article::new("A", "http://x/a")]), Duration::from_secs(300))
//!     .await;
//! assert_eq!(cache.get(site).await.unwrap().items.len(), 1);
//! # });
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::models::SiteSnapshot;

/// Cache key for a site
pub fn cache_key(site: &str) -> String {
    format!("news::{site}")
}

#[derive(Debug, Clone)]
struct Entry {
    snapshot: SiteSnapshot,
    expires_at: Instant,
}

/// Status of one cached entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStatus {
    pub key: String,
    pub items: usize,
    pub updated_at: DateTime<Utc>,
    pub expires_in_secs: u64,
}

/// Site key → latest snapshot, with whole-entry replacement
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for its site
    ///
    /// `updated_at` never moves backwards for a site: a snapshot stamped
    /// earlier than the one it replaces takes the previous timestamp.
    /// Returns the snapshot as stored.
    pub async fn publish(&self, mut snapshot: SiteSnapshot, ttl: Duration) -> SiteSnapshot {
        let key = cache_key(&snapshot.site);
        let mut entries = self.entries.write().await;

        if let Some(previous) = entries.get(&key) {
            if snapshot.updated_at < previous.snapshot.updated_at {
                snapshot.updated_at = previous.snapshot.updated_at;
            }
        }

        debug!(key = %key, items = snapshot.items.len(), ttl_secs = ttl.as_secs(), "Snapshot published");
        entries.insert(
            key,
            Entry {
                snapshot: snapshot.clone(),
                expires_at: Instant::now() + ttl,
            },
        );

        snapshot
    }

    /// Latest unexpired snapshot for a site
    pub async fn get(&self, site: &str) -> Option<SiteSnapshot> {
        let entries = self.entries.read().await;
        entries
            .get(&cache_key(site))
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.snapshot.clone())
    }

    /// Drop expired entries, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Status of every unexpired entry, sorted by key
    pub async fn status(&self) -> Vec<EntryStatus> {
        let now = Instant::now();
        let entries = self.entries.read().await;

        let mut status: Vec<EntryStatus> = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(key, entry)| EntryStatus {
                key: key.clone(),
                items: entry.snapshot.items.len(),
                updated_at: entry.snapshot.updated_at,
                expires_in_secs: entry.expires_at.duration_since(now).as_secs(),
            })
            .collect();
        status.sort_by(|a, b| a.key.cmp(&b.key));
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;

    const SITE: &str = "https://noticias.uol.com.br";
    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key(SITE), "news::https://noticias.uol.com.br");
    }

    #[tokio::test]
    async fn test_publish_replaces_whole_snapshot() {
        let cache = SnapshotCache::new();

        cache
            .publish(SiteSnapshot::new(SITE, vec![Article::new("A", "http://x/a")]), TTL)
            .await;
        cache.publish(SiteSnapshot::new(SITE, Vec::new()), TTL).await;

        let snapshot = cache.get(SITE).await.unwrap();
        assert!(snapshot.items.is_empty());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_updated_at_never_decreases() {
        let cache = SnapshotCache::new();
        let newer = SiteSnapshot::new(SITE, Vec::new());
        let mut older = SiteSnapshot::new(SITE, vec![Article::new("B", "http://x/b")]);
        older.updated_at = newer.updated_at - chrono::Duration::seconds(30);

        cache.publish(newer.clone(), TTL).await;
        let stored = cache.publish(older, TTL).await;

        assert_eq!(stored.updated_at, newer.updated_at);
        assert_eq!(cache.get(SITE).await.unwrap().items.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = SnapshotCache::new();
        cache
            .publish(SiteSnapshot::new(SITE, Vec::new()), Duration::from_secs(5))
            .await;
        assert!(cache.get(SITE).await.is_some());

        tokio::time::advance(Duration::from_secs(6)).await;

        assert!(cache.get(SITE).await.is_none());
        assert!(cache.status().await.is_empty());
        assert_eq!(cache.purge_expired().await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_site() {
        let cache = SnapshotCache::new();
        assert!(cache.get("https://g1.globo.com").await.is_none());
    }
}
