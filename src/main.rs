use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use manchete::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "manchete",
    version,
    about = "News headline extractor with feed discovery, HTML heuristics and a rolling cache",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides MANCHETE_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file; environment variables still override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API and keep the cache warm
    Serve {
        /// Address to bind, overriding the configuration
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Fetch the current articles of one site
    Fetch {
        /// Site URL (must be in the allowlist)
        site: String,

        /// Print JSON instead of a list
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Refresh the configured sites
    Refresh {
        /// Run a single cycle and exit
        #[arg(long, default_value = "false")]
        once: bool,
    },

    /// Replace the stored session cookies
    Cookies {
        /// Raw cookie string (`name=value; name2=value2`)
        cookies: String,
    },

    /// Show the allowed hosts
    Allowed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::from_env(),
    };
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    // Initialize tracing/logging
    setup_tracing(&config.logging.format, cli.verbose, &config.logging.level)?;
    config.validate().context("Invalid configuration")?;

    tracing::info!("manchete starting");

    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!(bind = ?bind, "Starting serve command");
            commands::serve(config, bind).await?;
        }

        Commands::Fetch { site, json } => {
            tracing::info!(site = %site, json = %json, "Starting fetch command");
            commands::fetch(config, site, json).await?;
        }

        Commands::Refresh { once } => {
            tracing::info!(once = %once, "Starting refresh command");
            commands::refresh(config, once).await?;
        }

        Commands::Cookies { cookies } => {
            tracing::info!("Starting cookies command");
            commands::cookies(config, cookies).await?;
        }

        Commands::Allowed => commands::allowed(&config),
    }

    tracing::info!("manchete completed successfully");
    Ok(())
}

/// `RUST_LOG` wins; otherwise `-v` means debug and the configured level applies
fn setup_tracing(format: &str, verbose: bool, level: &str) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("manchete=debug,info"),
        Err(_) => EnvFilter::try_new(format!("manchete={level},warn"))
            .context("Invalid log level")?,
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
