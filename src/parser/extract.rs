//! Article extraction from raw HTML
//!
//! Strategies run in a fixed order and feed one deduplicating accumulator.
//! The leading strategies always run; every later one is skipped once the
//! accumulator holds [`SHORT_CIRCUIT_THRESHOLD`] articles.

use scraper::{ElementRef, Html};
use std::collections::HashSet;
use tracing::debug;

use super::jsonld;
use super::sanitize::{char_len, clean_text};
use super::selectors::{
    ANCHOR, CARD_ARTICLE, CARD_HEADING, CARD_NEWS_PATH_ANCHOR, CARD_SECTION_ANCHOR, JSON_LD, META,
    THUMB_TITLE,
};
use crate::models::{Article, MAX_EXTRACTED_ARTICLES};
use crate::utils::{extract_host, resolve_url};

/// Article count after which optional strategies are skipped
pub const SHORT_CIRCUIT_THRESHOLD: usize = 10;

/// URL fragments that mark off-site links as news
pub const DEFAULT_NEWS_KEYWORDS: &[&str] = &[
    "noticia", "noticias", "news", "feed", "rss", "uol", "g1", "folha",
];

/// Host fragment that enables the publisher card strategy
pub const DEFAULT_CARD_MARKER: &str = "uol.com";

/// Ordered accumulator with case-insensitive (title, url) dedup
#[derive(Debug, Clone)]
pub struct ArticleSet {
    items: Vec<Article>,
    seen_titles: HashSet<String>,
    seen_urls: HashSet<String>,
    cap: usize,
}

impl ArticleSet {
    pub fn new(cap: usize) -> Self {
        Self {
            items: Vec::new(),
            seen_titles: HashSet::new(),
            seen_urls: HashSet::new(),
            cap,
        }
    }

    /// Accept the candidate when both its title and URL are unseen
    pub fn try_push(&mut self, title: String, url: String) -> bool {
        if self.is_full() {
            return false;
        }

        let article = Article::new(title, url);
        let (title_key, url_key) = article.identity();
        if self.seen_titles.contains(&title_key) || self.seen_urls.contains(&url_key) {
            return false;
        }

        self.seen_titles.insert(title_key);
        self.seen_urls.insert(url_key);
        self.items.push(article);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.cap
    }

    pub fn into_vec(self) -> Vec<Article> {
        self.items
    }
}

/// One self-contained heuristic for mining articles out of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Publisher-specific article cards and section listings
    PublisherCards,
    /// Thumbnail title headings with their enclosing or sibling link
    ThumbTitle,
    /// The page's own `og:title` / `og:url`
    OpenGraph,
    /// Article blocks in `application/ld+json` scripts
    JsonLd,
    /// Any link with a long enough text
    Anchors,
}

impl Strategy {
    /// Priority order
    pub const ALL: [Strategy; 5] = [
        Strategy::PublisherCards,
        Strategy::ThumbTitle,
        Strategy::OpenGraph,
        Strategy::JsonLd,
        Strategy::Anchors,
    ];

    /// Whether the strategy runs regardless of how many articles were found
    pub fn always_runs(&self) -> bool {
        matches!(self, Self::PublisherCards | Self::ThumbTitle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublisherCards => "publisher_cards",
            Self::ThumbTitle => "thumb_title",
            Self::OpenGraph => "open_graph",
            Self::JsonLd => "json_ld",
            Self::Anchors => "anchors",
        }
    }

    fn apply(&self, page: &Page<'_>, out: &mut ArticleSet) {
        match self {
            Self::PublisherCards => publisher_cards(page, out),
            Self::ThumbTitle => thumb_titles(page, out),
            Self::OpenGraph => open_graph(page, out),
            Self::JsonLd => json_ld(page, out),
            Self::Anchors => anchors(page, out),
        }
    }
}

/// Parsed page plus the context candidates are checked against
struct Page<'a> {
    doc: Html,
    base_url: &'a str,
    base_host: Option<String>,
    extractor: &'a ContentExtractor,
}

impl Page<'_> {
    /// Clean, resolve and filter a candidate, then offer it to the set
    fn offer(&self, out: &mut ArticleSet, raw_title: &str, href: &str, min_title: usize) -> bool {
        let title = clean_text(raw_title);
        if title.is_empty() || char_len(&title) < min_title {
            return false;
        }

        let Some(url) = resolve_url(self.base_url, href) else {
            return false;
        };
        if !self.extractor.is_likely_news(self.base_host.as_deref(), &url) {
            return false;
        }

        out.try_push(title, url)
    }
}

/// Multi-strategy article extractor
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    /// Lowercase URL fragments accepted for off-site links
    news_keywords: Vec<String>,

    /// Lowercase host fragment enabling the publisher card strategy
    card_marker: String,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self {
            news_keywords: DEFAULT_NEWS_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            card_marker: DEFAULT_CARD_MARKER.to_string(),
        }
    }
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the host fragment that enables publisher cards
    #[must_use]
    pub fn with_card_marker(mut self, marker: impl Into<String>) -> Self {
        self.card_marker = marker.into().to_lowercase();
        self
    }

    /// Extract up to 30 deduplicated articles from a page
    ///
    /// Pure function of its inputs. Candidate URLs are resolved against
    /// `base_url`; only http(s) URLs survive.
    pub fn extract(&self, html: &str, base_url: &str) -> Vec<Article> {
        let page = Page {
            doc: Html::parse_document(html),
            base_url,
            base_host: extract_host(base_url),
            extractor: self,
        };
        let mut out = ArticleSet::new(MAX_EXTRACTED_ARTICLES);

        for strategy in Strategy::ALL {
            if !strategy.always_runs() && out.len() >= SHORT_CIRCUIT_THRESHOLD {
                debug!(strategy = strategy.as_str(), count = out.len(), "Skipping strategy");
                continue;
            }
            if out.is_full() {
                break;
            }

            let before = out.len();
            strategy.apply(&page, &mut out);
            debug!(
                strategy = strategy.as_str(),
                added = out.len() - before,
                total = out.len(),
                "Strategy finished"
            );
        }

        out.into_vec()
    }

    /// Same host as the page, or a URL containing a news keyword
    pub fn is_likely_news(&self, base_host: Option<&str>, url: &str) -> bool {
        if let (Some(base), Some(host)) = (base_host, extract_host(url)) {
            if base == host {
                return true;
            }
        }

        let lower = url.to_lowercase();
        self.news_keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    fn cards_enabled(&self, base_host: Option<&str>) -> bool {
        !self.card_marker.is_empty()
            && base_host.is_some_and(|host| host.contains(self.card_marker.as_str()))
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn href_of(element: ElementRef<'_>) -> Option<&str> {
    element
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
}

/// Three passes, each tried only when the previous one found nothing
fn publisher_cards(page: &Page<'_>, out: &mut ArticleSet) {
    if !page.extractor.cards_enabled(page.base_host.as_deref()) {
        return;
    }

    let start = out.len();

    for card in page.doc.select(&CARD_ARTICLE) {
        let Some(anchor) = card.select(&ANCHOR).next() else {
            continue;
        };
        let Some(href) = href_of(anchor) else {
            continue;
        };
        let title = card
            .select(&CARD_HEADING)
            .next()
            .map(element_text)
            .unwrap_or_else(|| element_text(anchor));

        page.offer(out, &title, href, 8);
        if out.is_full() {
            break;
        }
    }
    if out.len() > start {
        return;
    }

    for anchor in page.doc.select(&CARD_SECTION_ANCHOR) {
        if let Some(href) = href_of(anchor) {
            page.offer(out, &element_text(anchor), href, 20);
        }
        if out.is_full() {
            break;
        }
    }
    if out.len() > start {
        return;
    }

    for anchor in page.doc.select(&CARD_NEWS_PATH_ANCHOR) {
        if let Some(href) = href_of(anchor) {
            page.offer(out, &element_text(anchor), href, 15);
        }
        if out.is_full() {
            break;
        }
    }
}

fn thumb_titles(page: &Page<'_>, out: &mut ArticleSet) {
    for heading in page.doc.select(&THUMB_TITLE) {
        let title = element_text(heading);

        let enclosing = heading
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "a");
        let anchor = enclosing.or_else(|| {
            heading
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(|parent| parent.select(&ANCHOR).next())
        });

        if let Some(href) = anchor.and_then(href_of) {
            page.offer(out, &title, href, 1);
        }
    }
}

fn meta_content<'a>(doc: &'a Html, key: &str) -> Option<&'a str> {
    doc.select(&META)
        .find(|meta| {
            let attrs = meta.value();
            attrs
                .attr("property")
                .is_some_and(|p| p.trim().eq_ignore_ascii_case(key))
                || attrs
                    .attr("name")
                    .is_some_and(|n| n.trim().eq_ignore_ascii_case(key))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
}

fn open_graph(page: &Page<'_>, out: &mut ArticleSet) {
    let title = meta_content(&page.doc, "og:title");
    let url = meta_content(&page.doc, "og:url");

    if let (Some(title), Some(url)) = (title, url) {
        page.offer(out, title, url, 1);
    }
}

fn json_ld(page: &Page<'_>, out: &mut ArticleSet) {
    for script in page.doc.select(&JSON_LD) {
        let json = element_text(script);
        if json.trim().is_empty() || !jsonld::is_article_block(&json) {
            continue;
        }

        let title = jsonld::extract_first_field(&json, &["headline", "name"]);
        let url = jsonld::extract_first_field(&json, &["url", "mainEntityOfPage"]);

        if let (Some(title), Some(url)) = (title, url) {
            page.offer(out, &title, &url, 1);
        }
    }
}

fn anchors(page: &Page<'_>, out: &mut ArticleSet) {
    for anchor in page.doc.select(&ANCHOR) {
        if let Some(href) = href_of(anchor) {
            page.offer(out, &element_text(anchor), href, 15);
        }
        if out.is_full() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str, base: &str) -> Vec<Article> {
        ContentExtractor::new().extract(html, base)
    }

    fn titles(items: &[Article]) -> Vec<&str> {
        items.iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn test_open_graph_single_article() {
        let html = r#"<html><head>
            <meta property="og:title" content="Breaking">
            <meta property="og:url" content="/a">
            </head><body><a href="/short">short</a></body></html>"#;

        let items = extract(html, "https://site.test");
        assert_eq!(items, vec![Article::new("Breaking", "https://site.test/a")]);
    }

    #[test]
    fn test_open_graph_name_attribute_case_insensitive() {
        let html = r#"<meta NAME="OG:Title" content="Via name"><meta name="og:URL" content="https://site.test/b">"#;
        let items = extract(html, "https://site.test/");
        assert_eq!(titles(&items), vec!["Via name"]);
    }

    #[test]
    fn test_thumb_title_enclosing_anchor() {
        let html = r#"<a href="/materia-1"><h3 class="thumb-title">Primeira &amp; melhor</h3></a>
            <div><h3 class="big thumb-title-x">Segunda</h3><span><a href="/materia-2">leia</a></span></div>"#;

        let items = extract(html, "https://site.test/");
        assert_eq!(
            items,
            vec![
                Article::new("Primeira & melhor", "https://site.test/materia-1"),
                Article::new("Segunda", "https://site.test/materia-2"),
            ]
        );
    }

    #[test]
    fn test_json_ld_headline_and_url() {
        let html = r#"<script type="application/ld+json">
            {"@context":"https://schema.org","@type":"NewsArticle",
             "headline":"Economia cresce","url":"https://site.test/economia"}
            </script>
            <script type="application/ld+json">{"@type":"Organization","name":"Site","url":"https://site.test/"}</script>"#;

        let items = extract(html, "https://site.test/");
        assert_eq!(
            items,
            vec![Article::new("Economia cresce", "https://site.test/economia")]
        );
    }

    #[test]
    fn test_generic_anchor_min_length() {
        let html = r#"<a href="/a">Curto</a>
            <a href="/b">Um título longo o bastante</a>
            <a href="">Outro título longo o bastante</a>
            <a href="javascript:void(0)">Título longo mas inválido</a>"#;

        let items = extract(html, "https://site.test/");
        assert_eq!(titles(&items), vec!["Um título longo o bastante"]);
    }

    #[test]
    fn test_news_filter_rejects_unrelated_hosts() {
        let html = r#"<a href="https://ads.example/promo">Compre agora com desconto</a>
            <a href="https://g1.globo.com/x">Manchete de outro portal aqui</a>
            <a href="https://blog.example/news/y">Notícia em blog externo aqui</a>"#;

        let items = extract(html, "https://site.test/");
        assert_eq!(
            titles(&items),
            vec!["Manchete de outro portal aqui", "Notícia em blog externo aqui"]
        );
    }

    #[test]
    fn test_dedup_is_case_insensitive() {
        let html = r#"<a href="/a">Manchete repetida do dia</a>
            <a href="/A">Outra manchete com mesmo link</a>
            <a href="/c">MANCHETE REPETIDA DO DIA</a>
            <a href="/d">Manchete realmente diferente</a>"#;

        let items = extract(html, "https://site.test/");
        assert_eq!(
            titles(&items),
            vec!["Manchete repetida do dia", "Manchete realmente diferente"]
        );
    }

    #[test]
    fn test_caps_at_thirty() {
        let html: String = (0..50)
            .map(|i| format!(r#"<a href="/n/{i}">Manchete número {i:02} do dia</a>"#))
            .collect();

        let items = extract(&html, "https://site.test/");
        assert_eq!(items.len(), MAX_EXTRACTED_ARTICLES);
        assert_eq!(items[0].url, "https://site.test/n/0");
    }

    #[test]
    fn test_short_circuit_after_ten() {
        let mut html: String = (0..10)
            .map(|i| {
                format!(r#"<a href="/t/{i}"><h3 class="thumb-title">Título {i}</h3></a>"#)
            })
            .collect();
        html.push_str(r#"<a href="/extra">Âncora genérica que seria aceita</a>"#);

        let items = extract(&html, "https://site.test/");
        assert_eq!(items.len(), 10);
        assert!(items.iter().all(|a| a.url.contains("/t/")));
    }

    #[test]
    fn test_publisher_cards_article_pass() {
        let html = r#"<article><a href="/noticias/1.htm"><h3>Governo anuncia medidas</h3></a></article>
            <article><a href="/noticias/2.htm">Curto</a></article>
            <main><a href="/noticias/3.htm">Texto longo de seção que não entra</a></main>"#;

        let items = extract(html, "https://noticias.uol.com.br/");
        assert_eq!(titles(&items)[0], "Governo anuncia medidas");
        assert!(!titles(&items).contains(&"Curto"));
    }

    #[test]
    fn test_publisher_cards_only_for_marked_hosts() {
        let html = r#"<article><a href="/x"><h2>Manchete curta</h2></a></article>"#;

        assert_eq!(extract(html, "https://noticias.uol.com.br/").len(), 1);
        assert!(extract(html, "https://site.test/").is_empty());
    }

    #[test]
    fn test_publisher_cards_fall_back_to_section_links() {
        let html = r#"<div class="section-news"><a href="/politica/x">Texto de seção suficientemente longo</a></div>"#;

        let items = extract(html, "https://noticias.uol.com.br/");
        assert_eq!(
            items,
            vec![Article::new(
                "Texto de seção suficientemente longo",
                "https://noticias.uol.com.br/politica/x"
            )]
        );
    }

    #[test]
    fn test_empty_document() {
        assert!(extract("", "https://site.test/").is_empty());
        assert!(extract("<html><body></body></html>", "not a url").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let html = r#"<meta property="og:title" content="X"><meta property="og:url" content="/x">
            <a href="/y">Uma manchete bastante longa</a>"#;
        assert_eq!(extract(html, "https://site.test/"), extract(html, "https://site.test/"));
    }

    #[test]
    fn test_article_set_rejects_when_either_key_seen() {
        let mut set = ArticleSet::new(5);
        assert!(set.try_push("A".into(), "http://x/a".into()));
        assert!(!set.try_push("a".into(), "http://x/b".into()));
        assert!(!set.try_push("B".into(), "HTTP://X/A".into()));
        assert!(set.try_push("B".into(), "http://x/b".into()));
        assert_eq!(set.len(), 2);
    }
}
