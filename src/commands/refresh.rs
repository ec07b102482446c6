use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use manchete::config::Config;
use manchete::crawler::ArticleSource;
use manchete::scheduler::CacheRefresher;

use super::Services;

/// Run the refresh loop in the foreground, or a single cycle with `once`
pub async fn refresh(config: Config, once: bool) -> Result<()> {
    let services = Services::build(&config).await?;
    let source: Arc<dyn ArticleSource> = services.scraper.clone();
    let refresher = Arc::new(CacheRefresher::new(
        source,
        Arc::clone(&services.cache),
        &config.refresh,
    ));
    let cancel = CancellationToken::new();

    if once {
        let report = refresher.run_cycle(&cancel).await;

        println!("Refresh Cycle Complete");
        println!("======================");
        println!("Published: {}", report.published);
        println!("Failed: {}", report.failed);
        for entry in services.cache.status().await {
            println!(
                "  {} - {} items (updated {})",
                entry.key,
                entry.items,
                entry.updated_at.to_rfc3339()
            );
        }
        return Ok(());
    }

    println!("Refreshing {} site(s) every {}s", refresher.sites().len(), config.refresh.interval_secs);
    println!("Press Ctrl+C to stop.\n");

    let handle = Arc::clone(&refresher).spawn(cancel.clone());
    match tokio::signal::ctrl_c().await {
        Ok(()) => println!("\nShutdown signal received, stopping..."),
        Err(e) => tracing::error!(error = %e, "Failed to wait for Ctrl+C"),
    }
    cancel.cancel();
    handle.await.context("Cache refresher task panicked")?;

    println!("Refresher stopped after {} cycles.", refresher.cycles());
    Ok(())
}
