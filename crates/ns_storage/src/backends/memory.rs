use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ns_core::{
    Article, ArticleStore, Error, ParsedArticle, Result, Settings, Source, SourceStore,
    UpsertCounts, UpsertOutcome, DEFAULT_SOURCES,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use crate::upsert::{self, UpsertPlan};
use crate::StorageBackend;

/// Plain in-process tables. Cloned wholesale so a batch can be applied to a
/// copy and swapped in only when every upsert succeeded.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sources: Vec<Source>,
    articles: Vec<Article>,
    next_source_id: i64,
    next_article_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_source_id: 1,
            next_article_id: 1,
            ..Default::default()
        }
    }

    fn add_source(&mut self, name: &str, url: &str, is_enabled: bool) -> Result<Source> {
        if self.sources.iter().any(|s| s.name == name || s.url == url) {
            return Err(Error::Storage(format!(
                "Source with name {} or url {} already exists",
                name, url
            )));
        }

        let now = Utc::now();
        let source = Source {
            id: self.next_source_id,
            name: name.to_string(),
            url: url.to_string(),
            logo_url: None,
            is_enabled,
            created_at: now,
            updated_at: now,
        };
        self.next_source_id += 1;
        self.sources.push(source.clone());
        Ok(source)
    }

    fn sorted_sources(&self, enabled_only: bool) -> Vec<Source> {
        let mut sources: Vec<Source> = self
            .sources
            .iter()
            .filter(|s| !enabled_only || s.is_enabled)
            .cloned()
            .collect();
        sources.sort_by(|a, b| a.name.cmp(&b.name));
        sources
    }

    fn upsert(&mut self, parsed: &ParsedArticle, source: &Source, seen_at: DateTime<Utc>) -> Result<UpsertOutcome> {
        // Mirrors the CHECK constraint on the SQL articles table.
        if parsed.position() == 0 {
            return Err(Error::Storage(format!("Position must be at least 1: {}", parsed.url())));
        }
        let index = self.articles.iter().position(|a| a.url == parsed.url());

        match upsert::plan_upsert(index.map(|i| &self.articles[i]), source) {
            UpsertPlan::Conflict { existing_source_id } => {
                upsert::log_conflict(parsed.url(), existing_source_id, source.id);
                Ok(UpsertOutcome::Skipped)
            }
            UpsertPlan::Update => {
                let article = index
                    .map(|i| &mut self.articles[i])
                    .ok_or_else(|| Error::Storage(format!("Article vanished: {}", parsed.url())))?;
                upsert::apply_update(article, parsed, seen_at);
                debug!(url = parsed.url(), position = parsed.position(), "Updated existing article");
                Ok(UpsertOutcome::Updated(article.clone()))
            }
            UpsertPlan::Create => {
                // Same guarantee the foreign key gives the SQL backend.
                if !self.sources.iter().any(|s| s.id == source.id) {
                    return Err(Error::Storage(format!("Unknown source id: {}", source.id)));
                }
                let article = upsert::new_article(self.next_article_id, parsed, source, seen_at);
                self.next_article_id += 1;
                self.articles.push(article.clone());
                debug!(url = parsed.url(), position = parsed.position(), "Created new article");
                Ok(UpsertOutcome::Created(article))
            }
        }
    }
}

pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    /// An empty store with no sources.
    pub fn empty() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
        }
    }

    /// A store seeded with the default source catalogue.
    pub fn new() -> Result<Self> {
        let mut store = MemoryStore::new();
        for (name, url) in DEFAULT_SOURCES {
            store.add_source(name, url, true)?;
        }
        Ok(Self {
            store: Arc::new(RwLock::new(store)),
        })
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn open(_settings: &Settings) -> Result<Self> {
        Self::new()
    }
}

#[async_trait]
impl ArticleStore for InMemoryStorage {
    async fn upsert_one(
        &self,
        parsed: &ParsedArticle,
        source: &Source,
        seen_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome> {
        let mut store = self.store.write().await;
        store.upsert(parsed, source, seen_at)
    }

    async fn bulk_upsert(
        &self,
        parsed: &[ParsedArticle],
        source: &Source,
        seen_at: DateTime<Utc>,
    ) -> Result<UpsertCounts> {
        let (unique, duplicates) = upsert::dedupe_batch(parsed);
        let mut counts = UpsertCounts {
            skipped: duplicates,
            ..Default::default()
        };

        let mut store = self.store.write().await;
        let mut working = store.clone();
        for article in unique {
            let outcome = working.upsert(article, source, seen_at)?;
            counts.record(&outcome);
        }
        *store = working;

        Ok(counts)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.articles.iter().find(|a| a.url == url).cloned())
    }

    async fn get_by_source(&self, source_id: i64) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        let mut articles: Vec<Article> = store
            .articles
            .iter()
            .filter(|a| a.source_id == source_id)
            .cloned()
            .collect();
        articles.sort_by_key(|a| a.position);
        Ok(articles)
    }
}

#[async_trait]
impl SourceStore for InMemoryStorage {
    async fn list_enabled_sources(&self) -> Result<Vec<Source>> {
        Ok(self.store.read().await.sorted_sources(true))
    }

    async fn find_source_by_name(&self, name: &str) -> Result<Option<Source>> {
        let store = self.store.read().await;
        Ok(store.sources.iter().find(|s| s.name == name).cloned())
    }

    async fn list_sources(&self) -> Result<Vec<Source>> {
        Ok(self.store.read().await.sorted_sources(false))
    }

    async fn add_source(&self, name: &str, url: &str, is_enabled: bool) -> Result<Source> {
        self.store.write().await.add_source(name, url, is_enabled)
    }
}
