use anyhow::{Context, Result};
use chrono::Utc;

use manchete::api::routes::NewsResponse;
use manchete::config::Config;

use super::Services;

/// Fetch one site's articles and print them
pub async fn fetch(config: Config, site: String, json: bool) -> Result<()> {
    let services = Services::build(&config).await?;

    let items = services
        .scraper
        .fetch_articles(&site)
        .await
        .with_context(|| format!("Failed to fetch articles from {site}"))?;

    if json {
        let response = NewsResponse {
            updated_at: Utc::now(),
            items,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("Articles from {site}");
    println!("========================");
    if items.is_empty() {
        println!("No articles found.");
    }
    for (idx, article) in items.iter().enumerate() {
        println!("{:>3}. {}", idx + 1, article.title);
        println!("     {}", article.url);
        if let Some(published) = article.published_at {
            println!("     {}", published.to_rfc3339());
        }
    }
    println!("\nTotal: {}", items.len());

    Ok(())
}
