// Core data structures for manchete

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard cap on the number of articles a single HTML extraction may return
pub const MAX_EXTRACTED_ARTICLES: usize = 30;

/// Hard cap on the number of entries read from one feed
pub const MAX_FEED_ARTICLES: usize = 50;

/// One extracted news item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub description: Option<String>,
    pub url: String, // always absolute
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Create an article with only a title and URL
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            url: url.into(),
            published_at: None,
        }
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a publish timestamp
    #[must_use]
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Case-insensitive identity used for deduplication
    pub fn identity(&self) -> (String, String) {
        (self.title.to_lowercase(), self.url.to_lowercase())
    }
}

/// All articles for one site as of one refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSnapshot {
    pub site: String,
    pub items: Vec<Article>,
    pub updated_at: DateTime<Utc>,
}

impl SiteSnapshot {
    /// Create a snapshot stamped with the current time
    pub fn new(site: impl Into<String>, items: Vec<Article>) -> Self {
        Self {
            site: site.into(),
            items,
            updated_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_builder() {
        let published = Utc::now();
        let article = Article::new("Título", "https://site.test/a")
            .with_description("Resumo")
            .with_published_at(published);

        assert_eq!(article.title, "Título");
        assert_eq!(article.description.as_deref(), Some("Resumo"));
        assert_eq!(article.published_at, Some(published));
    }

    #[test]
    fn test_article_identity_is_case_insensitive() {
        let a = Article::new("Breaking NEWS", "https://Site.test/A");
        let b = Article::new("breaking news", "https://site.test/a");
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_article_json_uses_camel_case() {
        let article = Article::new("Título", "https://site.test/a");
        let json = serde_json::to_string(&article).unwrap();

        assert!(json.contains("\"publishedAt\":null"));
        assert!(json.contains("\"description\":null"));
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = SiteSnapshot::new("https://site.test", vec![Article::new("A", "http://x/a")]);
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: SiteSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, snapshot);
        assert!(json.contains("\"updatedAt\""));
        assert_eq!(restored.len(), 1);
        assert!(!restored.is_empty());
    }
}
