//! HTTP fetcher with retry, shared cookies and an optional rendering proxy
//!
//! Every request carries a browser-like header set, uses the session's cookie
//! jar and follows a bounded number of redirects. Page fetches first go
//! through the rendering proxy when one is configured; a proxy failure falls
//! through to the direct path, which retries with linear backoff.

use encoding_rs::{Encoding, UTF_8};
use reqwest::{
    header::{HeaderMap, CONTENT_TYPE, SET_COOKIE},
    redirect, Client, Response,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::headers::{build_browser_headers, build_feed_headers};
use super::session::SessionState;
use crate::config::FetcherConfig;
use crate::utils::error::FetchError;
use crate::utils::retry::{with_retry, RetryPolicy};
use crate::utils::truncate_chars;

/// Third-party endpoint that executes JavaScript before returning the page
#[derive(Clone)]
pub struct RenderProxy {
    endpoint: String,
    api_key: String,
}

impl RenderProxy {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Proxy request URL for a target, with key and target URL-encoded
    pub fn request_url(&self, target: &str) -> String {
        format!(
            "{}?api_key={}&url={}&render=true",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(&self.api_key),
            urlencoding::encode(target)
        )
    }
}

impl std::fmt::Debug for RenderProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderProxy")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Raw successful response
struct Fetched {
    body: Vec<u8>,
    content_type: String,
    set_cookie: bool,
}

/// Page and feed fetcher
pub struct Fetcher {
    /// HTTP client with the session jar installed
    client: Client,

    session: Arc<SessionState>,

    retry: RetryPolicy,

    user_agent: String,

    accept_language: String,

    /// Characters of a failed response body kept in the error
    snippet_chars: usize,

    render_proxy: Option<RenderProxy>,
}

impl Fetcher {
    /// Create a fetcher from configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` if the HTTP client cannot be created
    pub fn new(config: &FetcherConfig, session: Arc<SessionState>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .redirect(redirect::Policy::limited(config.max_redirects))
            .cookie_provider(session.jar())
            .gzip(true)
            .deflate(true)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(FetchError::Client)?;

        let render_proxy = config
            .render_proxy_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| RenderProxy::new(&config.render_proxy_endpoint, key));

        Ok(Self {
            client,
            session,
            retry: RetryPolicy::with_delays(
                config.max_attempts,
                config.backoff_step_ms,
                config.backoff_jitter_ms,
            ),
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            snippet_chars: config.snippet_chars,
            render_proxy,
        })
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace (or remove) the rendering proxy
    #[must_use]
    pub fn with_render_proxy(mut self, proxy: Option<RenderProxy>) -> Self {
        self.render_proxy = proxy;
        self
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn has_render_proxy(&self) -> bool {
        self.render_proxy.is_some()
    }

    /// Fetch a page as text
    ///
    /// Tries the rendering proxy once when configured, then the direct path
    /// with retries.
    ///
    /// # Errors
    ///
    /// Returns the error of the final direct attempt
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        if let Some(proxy) = &self.render_proxy {
            debug!(url, "Fetching through rendering proxy");
            let proxied = proxy.request_url(url);
            match self.send(&proxied, self.page_headers(url)).await {
                Ok(fetched) => {
                    self.after_success(&fetched).await;
                    return Ok(decode_body(&fetched.body, &fetched.content_type));
                }
                Err(e) => {
                    warn!(url, status = ?e.status(), "Rendering proxy failed, falling back to direct fetch");
                }
            }
        }

        let fetched = with_retry(&self.retry, |attempt| {
            debug!(url, attempt, "Fetching page");
            self.send(url, self.page_headers(url))
        })
        .await?;

        self.after_success(&fetched).await;
        Ok(decode_body(&fetched.body, &fetched.content_type))
    }

    /// Fetch a feed document as raw bytes (direct path only)
    ///
    /// # Errors
    ///
    /// Returns the error of the final attempt
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        let fetched = with_retry(&self.retry, |attempt| {
            debug!(url, attempt, "Fetching feed");
            self.send(
                url,
                build_feed_headers(&self.user_agent, &self.accept_language, url),
            )
        })
        .await?;

        self.after_success(&fetched).await;
        Ok(fetched.body)
    }

    fn page_headers(&self, url: &str) -> HeaderMap {
        build_browser_headers(&self.user_agent, &self.accept_language, url)
    }

    /// One GET; any non-2xx status is an error carrying a body snippet
    async fn send(&self, url: &str, headers: HeaderMap) -> Result<Fetched, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let snippet = response
                .text()
                .await
                .map(|body| truncate_chars(&body, self.snippet_chars))
                .unwrap_or_default();

            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                snippet,
            });
        }

        read_response(url, response).await
    }

    /// Persist the jar when the server handed out cookies
    async fn after_success(&self, fetched: &Fetched) {
        if fetched.set_cookie {
            if let Err(e) = self.session.persist().await {
                warn!(error = %e, "Failed to persist session cookies");
            }
        }
    }
}

async fn read_response(url: &str, response: Response) -> Result<Fetched, FetchError> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_default();
    let set_cookie = response.headers().contains_key(SET_COOKIE);

    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?
        .to_vec();

    Ok(Fetched {
        body,
        content_type,
        set_cookie,
    })
}

/// Decode a response body to text
///
/// Uses the `Content-Type` charset when it names a known encoding, then a
/// `<meta charset>` declaration near the top of the document, then UTF-8.
/// Invalid sequences are replaced rather than rejected.
pub fn decode_body(bytes: &[u8], content_type: &str) -> String {
    let encoding = charset_from_content_type(content_type)
        .or_else(|| charset_from_meta(bytes))
        .unwrap_or(UTF_8);

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(encoding = encoding.name(), "Body contained invalid sequences");
    }
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Encoding::for_label(value.trim().trim_matches('"').as_bytes())
        } else {
            None
        }
    })
}

fn charset_from_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(2048)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    let pos = head.find("charset=")?;
    let label: String = head[pos + "charset=".len()..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect();

    Encoding::for_label(label.as_bytes())
}
