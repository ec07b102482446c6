use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use manchete::api::{ApiServer, AppState};
use manchete::config::Config;
use manchete::crawler::ArticleSource;
use manchete::scheduler::CacheRefresher;

use super::Services;

/// Start the API server with the cache refresher running alongside
pub async fn serve(mut config: Config, bind: Option<SocketAddr>) -> Result<()> {
    if let Some(addr) = bind {
        config.server.bind_address = addr;
    }

    let services = Services::build(&config).await?;
    let source: Arc<dyn ArticleSource> = services.scraper.clone();

    println!("Starting manchete server");
    println!("========================");
    println!("  Bind: {}", config.server.bind_address);
    println!(
        "  Allowed hosts: {}",
        services.scraper.allowlist().allowed_hosts().join(", ")
    );
    println!("  Refresh sites: {}", config.refresh.sites.join(", "));
    println!(
        "  Refresh: every {}s, TTL {}s",
        config.refresh.interval_secs, config.refresh.ttl_secs
    );
    println!(
        "  Rendering proxy: {}",
        if services.scraper.fetcher().has_render_proxy() {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  Admin endpoint: {}",
        if config.server.admin_token.is_some() {
            "enabled"
        } else {
            "disabled (ADMIN_TOKEN not set)"
        }
    );
    println!();

    let cancel = CancellationToken::new();
    let refresher = Arc::new(CacheRefresher::new(
        Arc::clone(&source),
        Arc::clone(&services.cache),
        &config.refresh,
    ));
    let refresher_handle = Arc::clone(&refresher).spawn(cancel.clone());

    let state = AppState {
        scraper: source,
        allowlist: Arc::clone(services.scraper.allowlist()),
        cache: Arc::clone(&services.cache),
        session: Arc::clone(&services.session),
        admin_token: config.server.admin_token.clone(),
        default_site: config.server.default_site.clone(),
        start_time: Instant::now(),
    };
    let server = ApiServer::new(config.server.clone(), state);

    println!("API Endpoints:");
    println!("  GET  /health                     - Health check");
    println!("  GET  /api/noticias?site=         - HTML article list");
    println!("  GET  /api/noticias/json?site=    - JSON article list");
    println!("  GET  /api/noticias/cached?site=  - Cached snapshot");
    println!("  POST /api/admin/cookies          - Replace session cookies");
    println!();
    println!("Press Ctrl+C to stop.\n");

    let shutdown = cancel.clone();
    let served = server
        .start_with_shutdown(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => tracing::info!("Shutdown signal received"),
                    Err(e) => tracing::error!(error = %e, "Failed to wait for Ctrl+C"),
                },
                _ = shutdown.cancelled() => {}
            }
        })
        .await;

    cancel.cancel();
    refresher_handle
        .await
        .context("Cache refresher task panicked")?;

    served?;
    println!(
        "manchete server stopped after {} refresh cycles.",
        refresher.cycles()
    );
    Ok(())
}
