use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::types::{Article, ParsedArticle, Source, UpsertCounts, UpsertOutcome};
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Create or update the article for `parsed.url`.
    ///
    /// URLs are unique across sources. An article already owned by another
    /// source is left untouched and the outcome is `Skipped`.
    async fn upsert_one(
        &self,
        parsed: &ParsedArticle,
        source: &Source,
        seen_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome>;

    /// Apply `upsert_one` to every article in order as a single unit of work.
    /// On error nothing from the batch is kept.
    async fn bulk_upsert(
        &self,
        parsed: &[ParsedArticle],
        source: &Source,
        seen_at: DateTime<Utc>,
    ) -> Result<UpsertCounts>;

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>>;

    /// Articles owned by a source, ordered by position.
    async fn get_by_source(&self, source_id: i64) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Enabled sources ordered by name.
    async fn list_enabled_sources(&self) -> Result<Vec<Source>>;

    async fn find_source_by_name(&self, name: &str) -> Result<Option<Source>>;

    /// All sources ordered by name.
    async fn list_sources(&self) -> Result<Vec<Source>>;

    async fn add_source(&self, name: &str, url: &str, is_enabled: bool) -> Result<Source>;
}

/// A backend that persists both sources and articles.
pub trait Storage: ArticleStore + SourceStore {}

impl<T: ArticleStore + SourceStore> Storage for T {}
