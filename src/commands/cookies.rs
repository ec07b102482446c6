use anyhow::{Context, Result};

use manchete::config::Config;
use manchete::crawler::{HostAllowlist, SessionState};

/// Replace the stored cookies for every tracked root domain
pub async fn cookies(config: Config, raw: String) -> Result<()> {
    let session = SessionState::from_config(&config.cookies);
    let count = session
        .update_cookies(&raw)
        .await
        .context("Failed to update cookies")?;

    println!("Stored {count} cookie(s)");
    for root in session.store().roots() {
        println!("  {} -> {}", root, session.store().file_for(root).display());
    }
    Ok(())
}

/// Print the hosts the allowlist accepts
pub fn allowed(config: &Config) {
    let allowlist = HostAllowlist::from_csv(&config.allowlist.sites, config.allowlist.match_mode);

    println!("Allowed hosts ({} matching):", allowlist.mode());
    if allowlist.is_empty() {
        println!("  (none)");
    }
    for host in allowlist.allowed_hosts() {
        println!("  {host}");
    }
}
