use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A front-page article as produced by a parser.
///
/// Decoupled from the persisted [`Article`]. Fields are private so a value
/// cannot change after the parser framework has assigned its position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedArticle {
    headline: String,
    url: String,
    position: u32,
    summary: Option<String>,
    image_url: Option<String>,
}

impl ParsedArticle {
    pub fn new(headline: impl Into<String>, url: impl Into<String>, position: u32) -> Self {
        Self {
            headline: headline.into(),
            url: url.into(),
            position,
            summary: None,
            image_url: None,
        }
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 1-based position on the page, 1 being the most prominent.
    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

/// What a site parser extracts from a single candidate element, before the
/// framework assigns a position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedArticleData {
    title: String,
    url: String,
    summary: Option<String>,
    image_url: Option<String>,
    // Carried through but not persisted yet.
    published_at: Option<DateTime<Utc>>,
    authors: Option<Vec<String>>,
}

impl ParsedArticleData {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    pub fn image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn published_at(mut self, published_at: Option<DateTime<Utc>>) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn authors(mut self, authors: Option<Vec<String>>) -> Self {
        self.authors = authors;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn get_summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn get_image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn get_published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn get_authors(&self) -> Option<&[String]> {
        self.authors.as_deref()
    }
}

/// A configured news source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    /// Slug used to look up the site parser.
    pub name: String,
    pub url: String,
    pub logo_url: Option<String>,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored front-page article. `url` is unique across all sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub headline: String,
    pub description: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    pub position: u32,
    pub source_id: i64,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(Article),
    Updated(Article),
    /// The URL belongs to another source, or was repeated within the batch.
    Skipped,
}

impl UpsertOutcome {
    pub fn into_article(self) -> Option<Article> {
        match self {
            Self::Created(article) | Self::Updated(article) => Some(article),
            Self::Skipped => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertCounts {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl UpsertCounts {
    pub fn record(&mut self, outcome: &UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created(_) => self.created += 1,
            UpsertOutcome::Updated(_) => self.updated += 1,
            UpsertOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped
    }
}

/// Summary of one source's scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeResult {
    pub articles: Vec<ParsedArticle>,
    pub created_count: usize,
    pub updated_count: usize,
    pub skipped_count: usize,
}

impl ScrapeResult {
    pub fn new(articles: Vec<ParsedArticle>, counts: UpsertCounts) -> Self {
        Self {
            articles,
            created_count: counts.created,
            updated_count: counts.updated,
            skipped_count: counts.skipped,
        }
    }
}

/// Sources seeded into a fresh store: `(name, front page url)`.
pub const DEFAULT_SOURCES: &[(&str, &str)] = &[
    ("infobae", "https://www.infobae.com"),
    ("lanacion", "https://www.lanacion.com.ar"),
    ("lapoliticaonline", "https://www.lapoliticaonline.com"),
];
