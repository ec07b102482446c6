//! Configuration management for manchete
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::crawler::allowlist::MatchMode;
use crate::utils::error::ConfigError;
use crate::utils::retry::RetryPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host allowlist
    pub allowlist: AllowlistConfig,

    /// HTTP fetcher
    pub fetcher: FetcherConfig,

    /// Cookie persistence
    pub cookies: CookieConfig,

    /// Background cache refresh
    pub refresh: RefreshConfig,

    /// API server
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Allowlist configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowlistConfig {
    /// Comma-separated full URLs or bare hostnames
    pub sites: String,

    /// Suffix matching behavior
    pub match_mode: MatchMode,
}

/// Fetcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Total attempts for the direct fetch path
    pub max_attempts: u32,

    /// Linear backoff step in milliseconds
    pub backoff_step_ms: u64,

    /// Random jitter upper bound in milliseconds
    pub backoff_jitter_ms: u64,

    /// Maximum redirects followed per request
    pub max_redirects: usize,

    /// Characters of response body kept on failure
    pub snippet_chars: usize,

    /// User agent string
    pub user_agent: String,

    /// Accept-Language header value
    pub accept_language: String,

    /// Rendering proxy API key (optional)
    pub render_proxy_key: Option<String>,

    /// Rendering proxy endpoint
    pub render_proxy_endpoint: String,

    /// Skip TLS certificate validation
    pub accept_invalid_certs: bool,
}

/// Cookie persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Directory holding one cookie file per root domain
    pub store_dir: PathBuf,

    /// Root domains the cookie seed applies to
    pub root_domains: Vec<String>,

    /// Raw `name=value; name2=value2` seed
    pub seed: Option<String>,
}

/// Refresh loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Sites kept warm in the cache, in processing order
    pub sites: Vec<String>,

    /// Seconds between cycles
    pub interval_secs: u64,

    /// Snapshot time-to-live in seconds
    pub ttl_secs: u64,

    /// Well-known feeds tried when a site yields nothing
    pub fallback_feeds: Vec<String>,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub bind_address: SocketAddr,

    /// Token required by admin endpoints; admin is disabled when unset
    pub admin_token: Option<String>,

    /// Permissive CORS
    pub enable_cors: bool,

    /// Site served when a request names none
    pub default_site: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

impl Default for AllowlistConfig {
    fn default() -> Self {
        Self {
            sites: String::from("https://noticias.uol.com.br/"),
            match_mode: MatchMode::DotBoundary,
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_attempts: 3,
            backoff_step_ms: 500,
            backoff_jitter_ms: 350,
            max_redirects: 10,
            snippet_chars: 1200,
            user_agent: String::from(DEFAULT_USER_AGENT),
            accept_language: String::from("pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7"),
            render_proxy_key: None,
            render_proxy_endpoint: String::from("http://api.scraperapi.com"),
            accept_invalid_certs: false,
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("Data"),
            root_domains: vec![
                String::from("https://uol.com.br/"),
                String::from("https://noticias.uol.com.br/"),
            ],
            seed: None,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            sites: vec![String::from("https://noticias.uol.com.br")],
            interval_secs: 60,
            ttl_secs: 300,
            fallback_feeds: vec![
                String::from("https://rss.uol.com.br/feed/noticias.xml"),
                String::from("https://g1.globo.com/rss/g1/"),
                String::from("https://feeds.folha.uol.com.br/emcimadahora/rss091.xml"),
            ],
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            admin_token: None,
            enable_cors: true,
            default_site: "https://noticias.uol.com.br/".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Read and parse an environment variable, falling back on absence or garbage
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Ignoring malformed environment value");
                default
            }
        },
        Err(_) => default,
    }
}

/// Non-empty environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a comma-separated list, dropping blanks
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Malformed values are logged and replaced by their defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.display().to_string(),
            source,
        })?;

        Ok(config.with_env_overrides())
    }

    /// Overlay environment variables on top of this configuration
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(sites) = env_opt("ALLOWED_SITES") {
            self.allowlist.sites = sites;
        }
        self.allowlist.match_mode = env_parse("MANCHETE_ALLOWLIST_MODE", self.allowlist.match_mode);

        let f = &mut self.fetcher;
        f.request_timeout_secs = env_parse("MANCHETE_REQUEST_TIMEOUT", f.request_timeout_secs);
        f.max_attempts = env_parse("MANCHETE_MAX_ATTEMPTS", f.max_attempts);
        if let Some(ua) = env_opt("MANCHETE_USER_AGENT") {
            f.user_agent = ua;
        }
        if let Some(key) = env_opt("SCRAPER_API_KEY") {
            f.render_proxy_key = Some(key);
        }
        if let Some(endpoint) = env_opt("SCRAPER_API_ENDPOINT") {
            f.render_proxy_endpoint = endpoint;
        }

        if let Some(dir) = env_opt("MANCHETE_COOKIE_DIR") {
            self.cookies.store_dir = PathBuf::from(dir);
        }
        if let Some(domains) = env_opt("MANCHETE_COOKIE_DOMAINS") {
            self.cookies.root_domains = split_list(&domains);
        }
        if let Some(seed) = env_opt("UOL_COOKIES").or_else(|| env_opt("MANCHETE_COOKIES")) {
            self.cookies.seed = Some(seed);
        }

        let r = &mut self.refresh;
        if let Some(sites) = env_opt("MANCHETE_REFRESH_SITES") {
            r.sites = split_list(&sites);
        }
        r.interval_secs = env_parse("MANCHETE_REFRESH_INTERVAL", r.interval_secs);
        r.ttl_secs = env_parse("MANCHETE_CACHE_TTL", r.ttl_secs);
        if let Some(feeds) = env_opt("MANCHETE_FALLBACK_FEEDS") {
            r.fallback_feeds = split_list(&feeds);
        }

        self.server.bind_address = env_parse("MANCHETE_BIND", self.server.bind_address);
        if let Some(token) = env_opt("ADMIN_TOKEN") {
            self.server.admin_token = Some(token);
        }
        if let Some(site) = env_opt("MANCHETE_DEFAULT_SITE") {
            self.server.default_site = site;
        }

        if let Some(level) = env_opt("MANCHETE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env_opt("MANCHETE_LOG_FORMAT") {
            self.logging.format = format;
        }

        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetcher.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "fetcher.request_timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.fetcher.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "fetcher.max_attempts",
                "must be greater than 0",
            ));
        }

        if self.refresh.interval_secs == 0 {
            return Err(ConfigError::invalid(
                "refresh.interval_secs",
                "must be greater than 0",
            ));
        }

        if self.refresh.ttl_secs == 0 {
            return Err(ConfigError::invalid("refresh.ttl_secs", "must be greater than 0"));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::invalid(
                "logging.format",
                format!("expected 'text' or 'json', got '{}'", self.logging.format),
            ));
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.fetcher.request_timeout_secs)
    }

    /// Retry policy for the direct fetch path
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_delays(
            self.fetcher.max_attempts,
            self.fetcher.backoff_step_ms,
            self.fetcher.backoff_jitter_ms,
        )
    }

    /// Interval between refresh cycles
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs)
    }

    /// Snapshot time-to-live
    #[must_use]
    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh.ttl_secs)
    }
}
