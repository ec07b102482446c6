//! Host allowlist gating every fetch target
//!
//! Entries come from a comma-separated list of full URLs or bare hostnames
//! and are normalized to lowercase hosts once, at startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use url::Url;

use crate::utils::error::ValidationError;

/// How a candidate host is compared against an allowlist entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Exact host or a subdomain separated by a dot
    #[default]
    DotBoundary,

    /// Additionally accepts any host ending with the entry text
    /// (`ol.com.br` matches `uol.com.br`)
    LegacySuffix,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DotBoundary => "dot_boundary",
            Self::LegacySuffix => "legacy_suffix",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "dot_boundary" | "strict" => Ok(Self::DotBoundary),
            "legacy_suffix" | "legacy" => Ok(Self::LegacySuffix),
            other => Err(format!("unknown match mode: {other}")),
        }
    }
}

/// Immutable set of hosts that may be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAllowlist {
    hosts: Vec<String>,
    mode: MatchMode,
}

impl HostAllowlist {
    /// Build an allowlist from already-separated entries
    ///
    /// Unusable entries are logged and skipped; duplicates keep their first
    /// position.
    pub fn new<I, S>(entries: I, mode: MatchMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hosts: Vec<String> = Vec::new();

        for entry in entries {
            let raw = entry.as_ref().trim();
            if raw.is_empty() {
                continue;
            }

            match normalize_entry(raw) {
                Some(host) if !hosts.contains(&host) => hosts.push(host),
                Some(_) => {}
                None => warn!(entry = raw, "Ignoring malformed allowlist entry"),
            }
        }

        Self { hosts, mode }
    }

    /// Parse a comma-separated list such as `https://noticias.uol.com.br/,g1.globo.com`
    pub fn from_csv(raw: &str, mode: MatchMode) -> Self {
        Self::new(raw.split(','), mode)
    }

    /// Whether the URL's host may be fetched
    ///
    /// Malformed URLs and URLs without a host are never allowed.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };

        self.is_host_allowed(&host.to_ascii_lowercase())
    }

    /// Whether an already-lowercased host matches an entry
    pub fn is_host_allowed(&self, host: &str) -> bool {
        self.hosts.iter().any(|entry| {
            if host == entry {
                return true;
            }
            if host.len() > entry.len()
                && host.ends_with(entry.as_str())
                && host.as_bytes()[host.len() - entry.len() - 1] == b'.'
            {
                return true;
            }
            self.mode == MatchMode::LegacySuffix && host.ends_with(entry.as_str())
        })
    }

    /// Check a URL, producing the rejection error callers surface to users
    pub fn check(&self, url: &str) -> Result<(), ValidationError> {
        if Url::parse(url.trim()).is_err() {
            return Err(ValidationError::InvalidUrl(url.to_string()));
        }

        if self.is_allowed(url) {
            Ok(())
        } else {
            Err(ValidationError::HostNotAllowed {
                url: url.to_string(),
                allowed: self.hosts.join(", "),
            })
        }
    }

    /// Allowed hosts in configuration order
    pub fn allowed_hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Normalize a full URL or bare hostname into a lowercase host
fn normalize_entry(raw: &str) -> Option<String> {
    let lower = raw.to_ascii_lowercase();

    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Url::parse(&lower)
            .ok()?
            .host_str()
            .map(|h| h.trim_end_matches('.').to_string())
            .filter(|h| !h.is_empty());
    }

    let host = lower.trim_end_matches('/').trim_end_matches('.');
    if host.is_empty() || host.contains(['/', ' ', '?', '#']) {
        return None;
    }

    Some(host.to_string())
}
