//! CSS selectors used by the extraction strategies and feed discovery

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    // Feed discovery
    pub static ref FEED_LINK: Selector = parse_selector!("link[rel][href]");

    // Generic
    pub static ref ANCHOR: Selector = parse_selector!("a[href]");

    // Publisher cards
    pub static ref CARD_ARTICLE: Selector = parse_selector!("article");
    pub static ref CARD_HEADING: Selector = parse_selector!("h2, h3, h4");
    pub static ref CARD_SECTION_ANCHOR: Selector = parse_selector!(
        "main a[href], div[class*='home'] a[href], div[class*='section'] a[href]"
    );
    pub static ref CARD_NEWS_PATH_ANCHOR: Selector = parse_selector!(
        "a[href*='/noticias/'], a[href*='/noticias.'], a[href*='/noticias-']"
    );

    // Thumbnail title headings
    pub static ref THUMB_TITLE: Selector = parse_selector!("h3[class*='thumb-title']");

    // Metadata
    pub static ref META: Selector = parse_selector!("meta[content]");
    pub static ref JSON_LD: Selector = parse_selector!("script[type='application/ld+json']");
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile() {
        let _ = &*FEED_LINK;
        let _ = &*ANCHOR;
        let _ = &*CARD_ARTICLE;
        let _ = &*CARD_HEADING;
        let _ = &*CARD_SECTION_ANCHOR;
        let _ = &*CARD_NEWS_PATH_ANCHOR;
        let _ = &*THUMB_TITLE;
        let _ = &*META;
        let _ = &*JSON_LD;
    }

    #[test]
    fn test_section_anchor_matches_class_substring() {
        let html = Html::parse_document(
            r#"<div class="x-homepage"><a href="/a">one</a></div>
               <div class="sectionWrap"><a href="/b">two</a></div>
               <div class="other"><a href="/c">three</a></div>"#,
        );
        let hrefs: Vec<_> = html
            .select(&CARD_SECTION_ANCHOR)
            .filter_map(|a| a.value().attr("href"))
            .collect();
        assert_eq!(hrefs, vec!["/a", "/b"]);
    }

    #[test]
    fn test_news_path_anchor() {
        let html = Html::parse_document(
            r#"<a href="/noticias/2024/x.htm">a</a><a href="/noticias-ao-vivo">b</a>
               <a href="/esporte/y">c</a>"#,
        );
        assert_eq!(html.select(&CARD_NEWS_PATH_ANCHOR).count(), 2);
    }
}
