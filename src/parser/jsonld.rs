//! Targeted string-field lookup in JSON-LD blocks
//!
//! Only a handful of top-level-looking string fields are needed, so blocks are
//! scanned for the quoted key instead of being parsed as JSON. The first
//! occurrence anywhere in the block wins.

/// Whether a JSON-LD block describes an article
pub fn is_article_block(json: &str) -> bool {
    let lower = json.to_ascii_lowercase();
    lower.contains("newsarticle") || lower.contains("\"article\"")
}

/// Value of the first `"key": "value"` pair, matched case-insensitively
///
/// Returns `None` when the key is missing, the value is not a string, or the
/// string is empty. `\"` and `\/` escapes inside the value are unescaped.
///
/// # Examples
///
/// ```
/// use manchete::parser::jsonld::extract_string_field;
///
/// let json = r#"{"@type":"NewsArticle","headline":"Chuva forte","url":"https:\/\/site.test\/a"}"#;
/// assert_eq!(extract_string_field(json, "headline").as_deref(), Some("Chuva forte"));
/// assert_eq!(extract_string_field(json, "url").as_deref(), Some("https://site.test/a"));
/// ```
pub fn extract_string_field(json: &str, key: &str) -> Option<String> {
    let needle = format!("\"{}\"", key.to_ascii_lowercase());
    let start = json.to_ascii_lowercase().find(&needle)? + needle.len();

    let after_key = &json[start..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let body = rest.strip_prefix('"')?;

    let mut value = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return (!value.is_empty()).then_some(value),
            '\\' => match chars.next() {
                Some('"') => value.push('"'),
                Some('/') => value.push('/'),
                Some('\\') => value.push('\\'),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => return None,
            },
            _ => value.push(c),
        }
    }

    None
}

/// First present field among `keys`, in order
pub fn extract_first_field(json: &str, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| extract_string_field(json, key))
}
