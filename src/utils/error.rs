//! Error types for the manchete scraper
//!
//! This module defines the domain error types used throughout the application.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// Non-2xx response after all attempts
    #[error("GET {url} -> {status} {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
        /// Leading part of the response body, for diagnostics
        snippet: String,
    },

    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request timeout
    #[error("GET {url} timed out")]
    Timeout { url: String },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to build the HTTP client
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// URL the failed request was made to, when known
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Status { url, .. } | Self::Transport { url, .. } | Self::Timeout { url } => {
                Some(url)
            }
            Self::InvalidUrl(url) => Some(url),
            Self::Client(_) => None,
        }
    }

    /// HTTP status code, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Wrap a reqwest error, classifying timeouts separately
    pub fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// Errors that can occur during parsing operations
///
/// These never leave the parser layer; they are logged and turned into an
/// empty result.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Feed document could not be parsed as RSS or Atom
    #[error("Feed parse error for {url}: {reason}")]
    Feed { url: String, reason: String },
}

/// Request validation failures, raised before any network call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Host is not on the allowlist
    #[error("Host not allowed: {url} (allowed: {allowed})")]
    HostNotAllowed { url: String, allowed: String },

    /// URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Cookie update carried no `name=value` pair
    #[error("No cookies in update")]
    EmptyCookies,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A field holds an unusable value
    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },

    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("Failed to parse config file {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message_includes_url_and_status() {
        let err = FetchError::Status {
            url: "https://site.test/".to_string(),
            status: 503,
            reason: "Service Unavailable".to_string(),
            snippet: "<html>down</html>".to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("https://site.test/"));
        assert!(message.contains("503"));
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.url(), Some("https://site.test/"));
    }

    #[test]
    fn test_validation_error_lists_allowed_hosts() {
        let err = ValidationError::HostNotAllowed {
            url: "http://evil.example/".to_string(),
            allowed: "noticias.uol.com.br".to_string(),
        };
        assert!(err.to_string().contains("noticias.uol.com.br"));
    }

    #[test]
    fn test_config_error_helper() {
        let err = ConfigError::invalid("interval_secs", "must be greater than 0");
        assert!(err.to_string().contains("interval_secs"));
    }
}
