//! Text cleanup for titles and descriptions mined from HTML and feeds

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Clean a title or description fragment
///
/// Steps:
/// 1. Remove zero-width and control characters
/// 2. Decode HTML entities
/// 3. Collapse all whitespace runs (newlines included) to one space
/// 4. Trim
///
/// # Examples
///
/// ```
/// use manchete::parser::sanitize::clean_text;
///
/// assert_eq!(clean_text("  Lula &amp; Congresso\n\t votam "), "Lula & Congresso votam");
/// ```
pub fn clean_text(text: &str) -> String {
    let visible = remove_invisible(text);
    let decoded = html_escape::decode_html_entities(&visible);
    WHITESPACE_REGEX.replace_all(&decoded, " ").trim().to_string()
}

/// Clean a feed summary, which may carry markup
///
/// Returns `None` when nothing readable is left.
pub fn clean_summary(text: &str) -> Option<String> {
    let without_tags = TAG_REGEX.replace_all(text, " ");
    let cleaned = clean_text(&without_tags);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Remove zero-width characters and control characters
///
/// Whitespace controls (`\n`, `\t`, `\r`) are kept so they still separate
/// words before whitespace is collapsed.
pub fn remove_invisible(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(*c, '\u{200B}'..='\u{200F}' | '\u{2060}' | '\u{FEFF}')
                && (!c.is_control() || c.is_whitespace())
        })
        .collect()
}

/// Length in characters, the unit all minimum-title rules use
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Escape text for inclusion in an HTML page
pub fn escape_html(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escape text for inclusion in a double-quoted HTML attribute
pub fn escape_attribute(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}
