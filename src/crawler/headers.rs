use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT,
};

use crate::utils::origin_url;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

const ACCEPT_FEED: &str =
    "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/xml;q=0.8,*/*;q=0.5";

/// Build browser-like headers for a page request
///
/// The referer is the origin of the requested URL. Values that are not valid
/// header text are left out rather than failing the request.
///
/// # Examples
///
/// ```
/// use manchete::crawler::headers::build_browser_headers;
///
/// let headers = build_browser_headers(
///     "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
///     "pt-BR,pt;q=0.9",
///     "https://noticias.uol.com.br/politica/",
/// );
/// assert_eq!(headers["referer"], "https://noticias.uol.com.br/");
/// ```
pub fn build_browser_headers(user_agent: &str, accept_language: &str, url: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    if let Ok(value) = HeaderValue::from_str(accept_language) {
        headers.insert(ACCEPT_LANGUAGE, value);
    }
    if let Some(referer) = origin_url(url).and_then(|o| HeaderValue::from_str(&o).ok()) {
        headers.insert(REFERER, referer);
    }

    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );

    // Sec-Fetch hints of a top-level navigation typed into the address bar
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );

    headers
}

/// Headers for a feed download: the page set with a feed-oriented Accept
pub fn build_feed_headers(user_agent: &str, accept_language: &str, url: &str) -> HeaderMap {
    let mut headers = build_browser_headers(user_agent, accept_language, url);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_FEED));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    const UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

    #[test]
    fn test_build_browser_headers() {
        let headers = build_browser_headers(UA, "pt-BR,pt;q=0.9", "https://site.test/a/b?c=1");

        assert_eq!(headers.get(USER_AGENT).unwrap(), UA);
        assert_eq!(headers.get(ACCEPT_LANGUAGE).unwrap(), "pt-BR,pt;q=0.9");
        assert_eq!(headers.get(REFERER).unwrap(), "https://site.test/");
        assert_eq!(headers.get("sec-fetch-site").unwrap(), "none");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert_eq!(headers.get("sec-fetch-user").unwrap(), "?1");
        assert_eq!(headers.get("sec-fetch-dest").unwrap(), "document");
        assert_eq!(headers.get("upgrade-insecure-requests").unwrap(), "1");
        assert!(headers.get(ACCEPT).unwrap().to_str().unwrap().contains("text/html"));
    }

    #[test]
    fn test_invalid_values_are_skipped() {
        let headers = build_browser_headers("bad\nagent", "pt-BR", "not a url");

        assert!(!headers.contains_key(USER_AGENT));
        assert!(!headers.contains_key(REFERER));
        assert!(headers.contains_key(ACCEPT));
    }

    #[test]
    fn test_feed_headers_accept() {
        let headers = build_feed_headers(UA, "pt-BR", "https://site.test/rss.xml");
        let accept = headers.get(ACCEPT).unwrap().to_str().unwrap();

        assert!(accept.starts_with("application/rss+xml"));
        assert!(headers.contains_key(REFERER));
    }
}
