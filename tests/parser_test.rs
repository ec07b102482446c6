//! Parser integration tests using HTML and feed fixture files

use chrono::{TimeZone, Utc};
use std::fs;

use manchete::parser::{discover_feeds, parse_feed, ContentExtractor};

/// Test fixture paths
const FIXTURES_DIR: &str = "tests/fixtures";

fn load_fixture(filename: &str) -> String {
    let path = format!("{FIXTURES_DIR}/{filename}");
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {path}"))
}

fn titles(items: &[manchete::Article]) -> Vec<&str> {
    items.iter().map(|a| a.title.as_str()).collect()
}

// ============================================================================
// Feed Discovery Tests
// ============================================================================

#[test]
fn test_discover_feeds_in_portal_home() {
    let html = load_fixture("html/portal_home.html");
    let feeds: Vec<String> = discover_feeds(&html, "https://noticias.uol.com.br/").collect();

    assert_eq!(
        feeds,
        vec![
            "https://rss.uol.com.br/feed/noticias.xml",
            "https://noticias.uol.com.br/atom.xml",
            "https://rss.uol.com.br/feed/noticias.xml",
        ]
    );
}

#[test]
fn test_discover_feeds_ignores_other_links() {
    let html = r#"<html><head>
        <link rel="stylesheet" type="text/css" href="/a.css">
        <link rel="alternate" hreflang="en" href="/en/">
        <link rel="alternate" type="application/json" href="/feed.json">
        <link rel="ALTERNATE" type="Application/RSS+XML" href="rss">
        </head></html>"#;

    let feeds: Vec<String> = discover_feeds(html, "https://site.test/secao/").collect();
    assert_eq!(feeds, vec!["https://site.test/secao/rss"]);
}

// ============================================================================
// HTML Extraction Tests
// ============================================================================

#[test]
fn test_portal_home_uses_publisher_cards_first() {
    let html = load_fixture("html/portal_home.html");
    let items = ContentExtractor::default().extract(&html, "https://noticias.uol.com.br/");

    assert_eq!(
        titles(&items),
        vec![
            "Congresso vota reforma tributária nesta semana",
            "Chuva forte deixa São Paulo em alerta",
            "Dólar fecha em queda após dados de emprego",
            "Final do campeonato termina empatada",
            "UOL Notícias - Últimas notícias do Brasil",
            "Governo anuncia novo programa de habitação",
            "Ministério da Saúde amplia vacinação",
        ]
    );
    assert_eq!(
        items[0].url,
        "https://noticias.uol.com.br/politica/ultimas-noticias/2025/01/06/congresso-vota.htm"
    );
    assert_eq!(
        items[5].url,
        "https://noticias.uol.com.br/cotidiano/2025/01/06/habitacao.htm"
    );
    assert!(items.iter().all(|a| a.description.is_none()));
}

#[test]
fn test_same_markup_on_other_host_skips_cards() {
    let html = load_fixture("html/portal_home.html");
    let items = ContentExtractor::default().extract(&html, "https://www.example.test/");

    assert_eq!(
        titles(&items),
        vec![
            "Final do campeonato termina empatada",
            "UOL Notícias - Últimas notícias do Brasil",
            "Governo anuncia novo programa de habitação",
            "Congresso vota reforma tributária nesta semana",
            "Chuva forte deixa São Paulo em alerta",
            "Dólar fecha em queda após dados de emprego",
            "Ministério da Saúde amplia vacinação",
        ]
    );
    assert_eq!(
        items[3].url,
        "https://www.example.test/politica/ultimas-noticias/2025/01/06/congresso-vota.htm"
    );
}

#[test]
fn test_custom_card_marker() {
    let html = load_fixture("html/portal_home.html");
    let items = ContentExtractor::default()
        .with_card_marker("example.test")
        .extract(&html, "https://www.example.test/");

    assert_eq!(items[0].title, "Congresso vota reforma tributária nesta semana");
}

// ============================================================================
// Feed Parsing Tests
// ============================================================================

#[test]
fn test_parse_rss_fixture() {
    let xml = load_fixture("feeds/rss.xml");
    let items = parse_feed(xml.as_bytes(), "https://noticias.uol.com.br/rss.xml").unwrap();

    assert_eq!(
        titles(&items),
        vec![
            "Lula & Congresso fecham acordo sobre orçamento",
            "Frente fria derruba temperaturas no Sul",
        ]
    );

    let first = &items[0];
    assert_eq!(
        first.url,
        "https://noticias.uol.com.br/politica/2025/01/06/orcamento.htm"
    );
    assert_eq!(
        first.description.as_deref(),
        Some("O texto segue para sanção presidencial.")
    );
    assert_eq!(
        first.published_at,
        Some(Utc.with_ymd_and_hms(2025, 1, 6, 16, 30, 0).unwrap())
    );

    assert_eq!(
        items[1].url,
        "https://noticias.uol.com.br/cotidiano/2025/01/06/frente-fria.htm"
    );
    assert!(items[1].published_at.is_none());
}

#[test]
fn test_parse_atom_fixture() {
    let xml = load_fixture("feeds/atom.xml");
    let items = parse_feed(xml.as_bytes(), "https://feeds.folha.uol.com.br/atom.xml").unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Bolsa sobe com alta de commodities");
    assert_eq!(
        items[0].url,
        "https://www1.folha.uol.com.br/mercado/2025/01/bolsa.shtml"
    );
    assert_eq!(items[0].description.as_deref(), Some("Ibovespa fecha em alta de 1,2%."));
    assert_eq!(
        items[0].published_at,
        Some(Utc.with_ymd_and_hms(2025, 1, 6, 14, 0, 0).unwrap())
    );

    assert_eq!(
        items[1].url,
        "https://www1.folha.uol.com.br/cotidiano/2025/01/por-id.shtml"
    );
}

#[test]
fn test_html_is_not_a_feed() {
    let html = load_fixture("html/portal_home.html");
    assert!(parse_feed(html.as_bytes(), "https://noticias.uol.com.br/").is_err());
}
