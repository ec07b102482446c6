//! Process-wide fetch session: the shared cookie jar and its on-disk store
//!
//! The jar is handed to the HTTP client as its cookie provider, so cookies
//! set by servers are picked up on every fetch. Explicit updates (startup
//! seed, admin endpoint) go through [`SessionState::update_cookies`], which
//! also rewrites one file per tracked root domain.

use reqwest::cookie::{CookieStore as _, Jar};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CookieConfig;
use crate::error::Result;
use crate::utils::error::ValidationError;

/// One file per root domain, holding a raw `name=value; ...` cookie string
#[derive(Debug, Clone)]
pub struct CookieStore {
    dir: PathBuf,
    roots: Vec<Url>,
}

impl CookieStore {
    /// Create a store for the given root domain URLs
    ///
    /// Roots that do not parse as URLs with a host are logged and dropped.
    pub fn new(dir: impl Into<PathBuf>, roots: &[String]) -> Self {
        let roots = roots
            .iter()
            .filter_map(|raw| match Url::parse(raw.trim()) {
                Ok(url) if url.host_str().is_some() => Some(url),
                _ => {
                    warn!(root = %raw, "Ignoring malformed cookie root domain");
                    None
                }
            })
            .collect();

        Self {
            dir: dir.into(),
            roots,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn roots(&self) -> &[Url] {
        &self.roots
    }

    /// Path of the cookie file for a root domain
    pub fn file_for(&self, root: &Url) -> PathBuf {
        let host = root.host_str().unwrap_or("default");
        self.dir.join(format!("{host}.cookies"))
    }

    /// Read the stored cookie string for a root, if any
    pub async fn read(&self, root: &Url) -> Option<String> {
        let path = self.file_for(root);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let content = content.trim().to_string();
                (!content.is_empty()).then_some(content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read cookie file");
                None
            }
        }
    }

    /// Overwrite the cookie file for a root
    pub async fn write(&self, root: &Url, cookies: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.file_for(root), cookies).await
    }

    /// Delete the cookie file for a root, if present
    pub async fn remove(&self, root: &Url) -> std::io::Result<()> {
        match tokio::fs::remove_file(self.file_for(root)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Split a `name=value; name2=value2` string into pairs
///
/// Fragments without a name are skipped.
pub fn parse_cookie_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|part| {
            let (name, value) = part.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Render pairs back into a `name=value; name2=value2` string
pub fn join_cookie_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Shared cookie jar plus its persistence
pub struct SessionState {
    jar: Arc<Jar>,
    store: CookieStore,

    /// Serializes writers of the cookie files
    write_lock: Mutex<()>,
}

impl SessionState {
    pub fn new(store: CookieStore) -> Self {
        Self {
            jar: Arc::new(Jar::default()),
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &CookieConfig) -> Self {
        Self::new(CookieStore::new(&config.store_dir, &config.root_domains))
    }

    /// Jar to install as the HTTP client's cookie provider
    pub fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    pub fn store(&self) -> &CookieStore {
        &self.store
    }

    /// Add cookie pairs to the jar for one root domain
    fn load_root(&self, root: &Url, pairs: &[(String, String)]) {
        for (name, value) in pairs {
            self.jar
                .add_cookie_str(&format!("{name}={value}; Path=/"), root);
        }
    }

    /// Expire every cookie the jar sends to `root` whose name is not in `keep`
    fn expire_root(&self, root: &Url, keep: &HashSet<&str>) {
        let Some(header) = self.cookie_header(root.as_str()) else {
            return;
        };

        for (name, _) in parse_cookie_pairs(&header) {
            if keep.contains(name.as_str()) {
                continue;
            }
            self.jar
                .add_cookie_str(&format!("{name}=; Max-Age=0; Path=/"), root);
            // Server-set cookies may be scoped to the domain instead of the host
            if let Some(host) = root.host_str() {
                self.jar
                    .add_cookie_str(&format!("{name}=; Max-Age=0; Path=/; Domain={host}"), root);
            }
        }
    }

    /// Make the pairs of a cookie string the jar's cookies for every root
    ///
    /// Cookies not named in `raw` are expired. A string without any pair
    /// leaves the jar untouched. Returns the number of pairs loaded.
    pub fn load_from_string(&self, raw: &str) -> usize {
        let pairs = parse_cookie_pairs(raw);
        if pairs.is_empty() {
            return 0;
        }

        let keep: HashSet<&str> = pairs.iter().map(|(name, _)| name.as_str()).collect();
        for root in self.store.roots() {
            self.expire_root(root, &keep);
            self.load_root(root, &pairs);
        }

        pairs.len()
    }

    /// Replace the session cookies and overwrite every root's file with them
    pub async fn update_cookies(&self, raw: &str) -> Result<usize> {
        let pairs = parse_cookie_pairs(raw);
        if pairs.is_empty() {
            return Err(ValidationError::EmptyCookies.into());
        }

        let count = self.load_from_string(raw);
        let stored = join_cookie_pairs(&pairs);

        let _guard = self.write_lock.lock().await;
        for root in self.store.roots() {
            self.store.write(root, &stored).await?;
        }

        info!(count, "Session cookies updated");
        Ok(count)
    }

    /// Write the jar's current cookies for each root domain to disk
    ///
    /// Roots the jar holds no cookies for lose their file.
    pub async fn persist(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        for root in self.store.roots() {
            match self.cookie_header(root.as_str()) {
                Some(header) => self.store.write(root, &header).await?,
                None => self.store.remove(root).await?,
            }
            debug!(root = %root, path = %self.store.file_for(root).display(), "Cookies persisted");
        }

        Ok(())
    }

    /// Load each root's stored cookie file into the jar
    async fn load_stored(&self) -> usize {
        let mut loaded = 0;

        for root in self.store.roots() {
            if let Some(stored) = self.store.read(root).await {
                let pairs = parse_cookie_pairs(&stored);
                self.load_root(root, &pairs);
                debug!(root = %root, count = pairs.len(), "Loaded stored cookies");
                loaded += pairs.len();
            }
        }

        loaded
    }

    /// Load startup cookies
    ///
    /// A seed with at least one pair replaces the stored cookies; otherwise
    /// each root's stored file is loaded. Roots left without cookies are
    /// reported.
    pub async fn init(&self, seed: Option<&str>) -> Result<usize> {
        let seed = seed.map(str::trim).filter(|s| !s.is_empty());

        let loaded = match seed {
            Some(seed) if !parse_cookie_pairs(seed).is_empty() => {
                let loaded = self.update_cookies(seed).await?;
                info!(count = loaded, "Loaded cookies from environment seed");
                loaded
            }
            _ => {
                if seed.is_some() {
                    warn!("Cookie seed has no name=value pairs, using stored cookies");
                }
                self.load_stored().await
            }
        };

        for root in self.store.roots() {
            if !self.has_cookies(root.as_str()) {
                warn!(
                    root = %root,
                    "No cookies for domain; copy `document.cookie` from a logged-in browser \
                     into UOL_COOKIES or POST it to /api/admin/cookies"
                );
            }
        }

        Ok(loaded)
    }

    /// `Cookie` header value the jar would send to this URL
    pub fn cookie_header(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        self.jar
            .cookies(&url)
            .and_then(|value| value.to_str().ok().map(String::from))
            .filter(|s| !s.is_empty())
    }

    pub fn has_cookies(&self, url: &str) -> bool {
        self.cookie_header(url).is_some()
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("store", &self.store)
            .field("jar", &"[REDACTED]")
            .finish()
    }
}
