//! Background cache refresh loop
//!
//! Two states: `Idle` while waiting out the interval, `Refreshing` while the
//! configured sites are processed one after another. Each site's result is
//! published as a fresh snapshot; a failing site is logged and skipped.
//! Cancellation is observed during the wait and between sites.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::SnapshotCache;
use crate::config::RefreshConfig;
use crate::crawler::orchestrator::ArticleSource;
use crate::models::SiteSnapshot;

/// Refresher state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Outcome of one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Sites whose snapshot was replaced
    pub published: usize,
    /// Sites whose fetch failed
    pub failed: usize,
    /// Sites not reached because of cancellation
    pub skipped: usize,
}

/// Periodically republishes a snapshot per configured site
pub struct CacheRefresher {
    source: Arc<dyn ArticleSource>,
    cache: Arc<SnapshotCache>,
    sites: Vec<String>,
    interval: Duration,
    ttl: Duration,
    state: RwLock<RefreshState>,
    cycles: AtomicU64,
}

impl CacheRefresher {
    pub fn new(
        source: Arc<dyn ArticleSource>,
        cache: Arc<SnapshotCache>,
        config: &RefreshConfig,
    ) -> Self {
        Self {
            source,
            cache,
            sites: config.sites.clone(),
            interval: Duration::from_secs(config.interval_secs),
            ttl: Duration::from_secs(config.ttl_secs),
            state: RwLock::new(RefreshState::Idle),
            cycles: AtomicU64::new(0),
        }
    }

    /// Override the wait between cycles
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override the snapshot TTL
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn state(&self) -> RefreshState {
        *self.state.read().await
    }

    /// Completed cycles
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    /// Process every configured site once, in order
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        *self.state.write().await = RefreshState::Refreshing;
        let mut report = CycleReport::default();

        for (idx, site) in self.sites.iter().enumerate() {
            if cancel.is_cancelled() {
                report.skipped = self.sites.len() - idx;
                debug!(skipped = report.skipped, "Refresh cycle cancelled");
                break;
            }

            match self.source.fetch_articles(site).await {
                Ok(items) => {
                    let snapshot = self
                        .cache
                        .publish(SiteSnapshot::new(site.as_str(), items), self.ttl)
                        .await;
                    info!(site = %site, count = snapshot.items.len(), "Snapshot refreshed");
                    report.published += 1;
                }
                Err(e) => {
                    warn!(site = %site, error = %e, "Refresh failed for site");
                    report.failed += 1;
                }
            }
        }

        let purged = self.cache.purge_expired().await;
        if purged > 0 {
            debug!(purged, "Dropped expired snapshots");
        }

        self.cycles.fetch_add(1, Ordering::Relaxed);
        *self.state.write().await = RefreshState::Idle;
        report
    }

    /// Cycle, wait, repeat until cancelled
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            sites = self.sites.len(),
            interval_secs = self.interval.as_secs(),
            ttl_secs = self.ttl.as_secs(),
            "Cache refresher started"
        );

        while !cancel.is_cancelled() {
            let report = self.run_cycle(&cancel).await;
            debug!(?report, cycle = self.cycles(), "Refresh cycle finished");

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        info!(cycles = self.cycles(), "Cache refresher stopped");
    }

    /// Run the loop on a background task
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result, ValidationError};
    use crate::models::Article;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns queued responses in order, then empty lists
    struct ScriptedSource {
        responses: Mutex<Vec<Result<Vec<Article>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<Article>>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ArticleSource for ScriptedSource {
        async fn fetch_articles(&self, site: &str) -> Result<Vec<Article>> {
            self.calls.lock().unwrap().push(site.to_string());
            self.responses.lock().unwrap().pop().unwrap_or(Ok(Vec::new()))
        }
    }

    fn config(sites: &[&str]) -> RefreshConfig {
        RefreshConfig {
            sites: sites.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cycle_publishes_then_replaces() {
        let source = ScriptedSource::new(vec![
            Ok(vec![Article::new("A", "http://x/a")]),
            Ok(Vec::new()),
        ]);
        let cache = Arc::new(SnapshotCache::new());
        let refresher = CacheRefresher::new(source, Arc::clone(&cache), &config(&["http://x"]));
        let cancel = CancellationToken::new();

        refresher.run_cycle(&cancel).await;
        let first = cache.get("http://x").await.unwrap();
        assert_eq!(first.items, vec![Article::new("A", "http://x/a")]);

        refresher.run_cycle(&cancel).await;
        let second = cache.get("http://x").await.unwrap();
        assert!(second.items.is_empty());
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(refresher.cycles(), 2);
        assert_eq!(refresher.state().await, RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_failed_site_does_not_stop_cycle() {
        let source = ScriptedSource::new(vec![
            Err(Error::Validation(ValidationError::InvalidUrl("bad".into()))),
            Ok(vec![Article::new("B", "http://y/b")]),
        ]);
        let cache = Arc::new(SnapshotCache::new());
        let refresher = CacheRefresher::new(
            source.clone(),
            Arc::clone(&cache),
            &config(&["bad", "http://y"]),
        );

        let report = refresher.run_cycle(&CancellationToken::new()).await;

        assert_eq!(report, CycleReport { published: 1, failed: 1, skipped: 0 });
        assert!(cache.get("bad").await.is_none());
        assert_eq!(cache.get("http://y").await.unwrap().items.len(), 1);
        assert_eq!(*source.calls.lock().unwrap(), vec!["bad", "http://y"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_drops_expired_snapshots() {
        let cache = Arc::new(SnapshotCache::new());
        cache
            .publish(SiteSnapshot::new("http://gone", Vec::new()), Duration::from_secs(1))
            .await;
        let refresher = CacheRefresher::new(
            ScriptedSource::new(Vec::new()),
            Arc::clone(&cache),
            &config(&["http://x"]),
        );

        tokio::time::advance(Duration::from_secs(2)).await;
        refresher.run_cycle(&CancellationToken::new()).await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.get("http://x").await.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_cycle_skips_sites() {
        let source = ScriptedSource::new(Vec::new());
        let refresher = CacheRefresher::new(
            source.clone(),
            Arc::new(SnapshotCache::new()),
            &config(&["http://a", "http://b"]),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = refresher.run_cycle(&cancel).await;

        assert_eq!(report.skipped, 2);
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_wait_stops_loop() {
        let source = ScriptedSource::new(Vec::new());
        let refresher = Arc::new(
            CacheRefresher::new(source.clone(), Arc::new(SnapshotCache::new()), &config(&["http://a"]))
                .with_interval(Duration::from_secs(60)),
        );
        let cancel = CancellationToken::new();
        let handle = Arc::clone(&refresher).spawn(cancel.clone());

        // First cycle runs immediately, then the loop waits
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(refresher.cycles(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(refresher.cycles(), 2);

        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(refresher.cycles(), 2);
        assert_eq!(source.calls.lock().unwrap().len(), 2);
        assert_eq!(refresher.state().await, RefreshState::Idle);
    }
}
