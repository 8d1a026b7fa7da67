use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ns_core::{
    Article, ArticleStore, Error, ParsedArticle, Result, Settings, Source, SourceStore,
    UpsertCounts, UpsertOutcome, DEFAULT_SOURCES,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use crate::upsert::{self, UpsertPlan};
use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS sources (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        url TEXT NOT NULL UNIQUE,
        logo_url TEXT,
        is_enabled INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        headline TEXT NOT NULL,
        description TEXT,
        url TEXT NOT NULL UNIQUE,
        image_url TEXT,
        position INTEGER NOT NULL CHECK (position >= 1),
        source_id INTEGER NOT NULL REFERENCES sources (id),
        last_seen_at TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_articles_source_id ON articles (source_id)",
    "CREATE INDEX IF NOT EXISTS ix_articles_last_seen_at ON articles (last_seen_at)",
    // Add future migrations here
];

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be writable at the configured --database path"
    }

    async fn open(settings: &Settings) -> Result<Self> {
        Self::new_with_path(&settings.database_path).await
    }
}

fn db_error(context: &str) -> impl Fn(sqlx::Error) -> Error + '_ {
    move |e| Error::Storage(format!("{}: {}", context, e))
}

fn parse_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column).map_err(db_error("Failed to read timestamp"))?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("Failed to parse {} '{}': {}", column, raw, e)))
}

fn source_from_row(row: &SqliteRow) -> Result<Source> {
    let read = db_error("Failed to read source row");
    Ok(Source {
        id: row.try_get("id").map_err(&read)?,
        name: row.try_get("name").map_err(&read)?,
        url: row.try_get("url").map_err(&read)?,
        logo_url: row.try_get("logo_url").map_err(&read)?,
        is_enabled: row.try_get("is_enabled").map_err(&read)?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let read = db_error("Failed to read article row");
    let position: i64 = row.try_get("position").map_err(&read)?;
    Ok(Article {
        id: row.try_get("id").map_err(&read)?,
        headline: row.try_get("headline").map_err(&read)?,
        description: row.try_get("description").map_err(&read)?,
        url: row.try_get("url").map_err(&read)?,
        image_url: row.try_get("image_url").map_err(&read)?,
        position: u32::try_from(position)
            .map_err(|_| Error::Database(format!("Invalid stored position: {}", position)))?,
        source_id: row.try_get("source_id").map_err(&read)?,
        last_seen_at: parse_timestamp(row, "last_seen_at")?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

async fn find_article_by_url(conn: &mut SqliteConnection, url: &str) -> Result<Option<Article>> {
    let row = sqlx::query("SELECT * FROM articles WHERE url = ?")
        .bind(url)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to look up article"))?;

    row.as_ref().map(article_from_row).transpose()
}

async fn insert_article(
    conn: &mut SqliteConnection,
    parsed: &ParsedArticle,
    source: &Source,
    seen_at: DateTime<Utc>,
) -> std::result::Result<Article, sqlx::Error> {
    let mut article = upsert::new_article(0, parsed, source, seen_at);

    let result = sqlx::query(
        r#"
        INSERT INTO articles
        (headline, description, url, image_url, position, source_id, last_seen_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.headline)
    .bind(article.description.as_deref())
    .bind(&article.url)
    .bind(article.image_url.as_deref())
    .bind(i64::from(article.position))
    .bind(article.source_id)
    .bind(article.last_seen_at.to_rfc3339())
    .bind(article.created_at.to_rfc3339())
    .bind(article.updated_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    article.id = result.last_insert_rowid();
    debug!(url = parsed.url(), position = parsed.position(), "Created new article");
    Ok(article)
}

async fn update_article(
    conn: &mut SqliteConnection,
    mut article: Article,
    parsed: &ParsedArticle,
    seen_at: DateTime<Utc>,
) -> Result<Article> {
    upsert::apply_update(&mut article, parsed, seen_at);

    sqlx::query(
        r#"
        UPDATE articles
        SET headline = ?, description = ?, image_url = ?, position = ?, last_seen_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&article.headline)
    .bind(article.description.as_deref())
    .bind(article.image_url.as_deref())
    .bind(i64::from(article.position))
    .bind(article.last_seen_at.to_rfc3339())
    .bind(article.updated_at.to_rfc3339())
    .bind(article.id)
    .execute(&mut *conn)
    .await
    .map_err(db_error("Failed to update article"))?;

    debug!(url = parsed.url(), position = parsed.position(), "Updated existing article");
    Ok(article)
}

/// Reconcile one article on an open connection or transaction.
async fn upsert_on(
    conn: &mut SqliteConnection,
    parsed: &ParsedArticle,
    source: &Source,
    seen_at: DateTime<Utc>,
) -> Result<UpsertOutcome> {
    let existing = find_article_by_url(conn, parsed.url()).await?;

    match upsert::plan_upsert(existing.as_ref(), source) {
        UpsertPlan::Conflict { existing_source_id } => {
            upsert::log_conflict(parsed.url(), existing_source_id, source.id);
            Ok(UpsertOutcome::Skipped)
        }
        UpsertPlan::Update => {
            let article = existing.ok_or_else(|| Error::Storage("Article vanished".to_string()))?;
            Ok(UpsertOutcome::Updated(update_article(conn, article, parsed, seen_at).await?))
        }
        UpsertPlan::Create => create_article(conn, parsed, source, seen_at).await,
    }
}

/// Insert a new article. A unique violation means another writer stored the
/// URL between our lookup and insert, so the stored row is reconciled instead.
async fn create_article(
    conn: &mut SqliteConnection,
    parsed: &ParsedArticle,
    source: &Source,
    seen_at: DateTime<Utc>,
) -> Result<UpsertOutcome> {
    match insert_article(conn, parsed, source, seen_at).await {
        Ok(article) => Ok(UpsertOutcome::Created(article)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let raced = find_article_by_url(conn, parsed.url()).await?;
            match upsert::plan_upsert(raced.as_ref(), source) {
                UpsertPlan::Update => {
                    let article = raced.ok_or_else(|| Error::Storage("Article vanished".to_string()))?;
                    Ok(UpsertOutcome::Updated(update_article(conn, article, parsed, seen_at).await?))
                }
                UpsertPlan::Conflict { existing_source_id } => {
                    upsert::log_conflict(parsed.url(), existing_source_id, source.id);
                    Ok(UpsertOutcome::Skipped)
                }
                UpsertPlan::Create => Err(Error::Storage(format!(
                    "Unique constraint failed but no article found for {}",
                    parsed.url()
                ))),
            }
        }
        Err(e) => Err(Error::Storage(format!("Failed to create article: {}", e))),
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to run migration {}: {}", i, e)))?;
        }

        let storage = Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        };
        storage.seed_default_sources().await?;
        info!(path = %db_path.display(), "SQLite storage ready");

        Ok(storage)
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn seed_default_sources(&self) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        for (name, url) in DEFAULT_SOURCES {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO sources (name, url, is_enabled, created_at, updated_at)
                VALUES (?, ?, 1, ?, ?)
                "#,
            )
            .bind(*name)
            .bind(*url)
            .bind(&now)
            .bind(&now)
            .execute(&*self.pool)
            .await
            .map_err(db_error("Failed to seed sources"))?;
        }
        Ok(())
    }

    async fn query_sources(&self, enabled_only: bool) -> Result<Vec<Source>> {
        let sql = if enabled_only {
            "SELECT * FROM sources WHERE is_enabled = 1 ORDER BY name"
        } else {
            "SELECT * FROM sources ORDER BY name"
        };
        let rows = sqlx::query(sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to list sources"))?;

        rows.iter().map(source_from_row).collect()
    }
}

#[async_trait]
impl ArticleStore for SQLiteStorage {
    async fn upsert_one(
        &self,
        parsed: &ParsedArticle,
        source: &Source,
        seen_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin transaction"))?;
        let outcome = upsert_on(&mut tx, parsed, source, seen_at).await?;
        tx.commit().await.map_err(db_error("Failed to commit transaction"))?;
        Ok(outcome)
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
        if unique.is_empty() {
            return Ok(counts);
        }

        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin transaction"))?;
        for article in unique {
            let outcome = upsert_on(&mut tx, article, source, seen_at).await?;
            counts.record(&outcome);
        }
        tx.commit().await.map_err(db_error("Failed to commit transaction"))?;

        Ok(counts)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        let mut conn = self.pool.acquire().await.map_err(db_error("Failed to acquire connection"))?;
        find_article_by_url(&mut conn, url).await
    }

    async fn get_by_source(&self, source_id: i64) -> Result<Vec<Article>> {
        let rows = sqlx::query("SELECT * FROM articles WHERE source_id = ? ORDER BY position")
            .bind(source_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to get articles by source"))?;

        rows.iter().map(article_from_row).collect()
    }
}

#[async_trait]
impl SourceStore for SQLiteStorage {
    async fn list_enabled_sources(&self) -> Result<Vec<Source>> {
        self.query_sources(true).await
    }

    async fn find_source_by_name(&self, name: &str) -> Result<Option<Source>> {
        let row = sqlx::query("SELECT * FROM sources WHERE name = ?")
            .bind(name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to look up source"))?;

        row.as_ref().map(source_from_row).transpose()
    }

    async fn list_sources(&self) -> Result<Vec<Source>> {
        self.query_sources(false).await
    }

    async fn add_source(&self, name: &str, url: &str, is_enabled: bool) -> Result<Source> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO sources (name, url, is_enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(url)
        .bind(is_enabled)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to add source"))?;

        Ok(Source {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            url: url.to_string(),
            logo_url: None,
            is_enabled,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_storage(dir: &tempfile::TempDir) -> SQLiteStorage {
        SQLiteStorage::new_with_path(&dir.path().join("test.db")).await.unwrap()
    }

    fn front_page() -> Vec<ParsedArticle> {
        vec![
            ParsedArticle::new("One", "https://test.com/one/", 1)
                .with_summary(Some("Summary one".to_string())),
            ParsedArticle::new("Two", "https://test.com/two/", 2)
                .with_image_url(Some("https://test.com/two.jpg".to_string())),
        ]
    }

    #[tokio::test]
    async fn test_seeds_default_sources_once() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("news.db");

        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        assert_eq!(storage.list_enabled_sources().await.unwrap().len(), 3);
        drop(storage);

        // Reopening must not duplicate the seeds.
        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        let sources = storage.list_sources().await.unwrap();
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].name, "infobae");
        assert!(storage.find_source_by_name("lanacion").await.unwrap().is_some());
        assert!(storage.find_source_by_name("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_source_enforces_unique_name() {
        let temp_dir = tempdir().unwrap();
        let storage = open_storage(&temp_dir).await;
        storage.add_source("testsource", "https://test.com", true).await.unwrap();
        assert!(storage.add_source("testsource", "https://else.com", true).await.is_err());
    }

    #[tokio::test]
    async fn test_upsert_one_creates_then_updates() {
        let temp_dir = tempdir().unwrap();
        let storage = open_storage(&temp_dir).await;
        let source = storage.add_source("testsource", "https://test.com", true).await.unwrap();

        let parsed = ParsedArticle::new("New Article", "https://test.com/new", 1)
            .with_summary(Some("Summary text".to_string()))
            .with_image_url(Some("https://test.com/image.jpg".to_string()));
        let created = storage
            .upsert_one(&parsed, &source, Utc::now())
            .await
            .unwrap()
            .into_article()
            .unwrap();
        assert_eq!(created.headline, "New Article");
        assert_eq!(created.description.as_deref(), Some("Summary text"));
        assert_eq!(created.source_id, source.id);

        let refreshed = ParsedArticle::new("New Headline", "https://test.com/new", 4);
        let outcome = storage.upsert_one(&refreshed, &source, Utc::now()).await.unwrap();
        let updated = match outcome {
            UpsertOutcome::Updated(article) => article,
            other => panic!("expected update, got {other:?}"),
        };
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.headline, "New Headline");
        assert_eq!(updated.description, None);
        assert_eq!(updated.image_url, None);
        assert_eq!(updated.position, 4);

        let stored = storage.find_by_url("https://test.com/new").await.unwrap().unwrap();
        assert_eq!(stored, updated);
        assert_eq!(stored.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_cross_source_conflict_keeps_owner() {
        let temp_dir = tempdir().unwrap();
        let storage = open_storage(&temp_dir).await;
        let owner = storage.add_source("testsource", "https://test.com", true).await.unwrap();
        let other = storage.add_source("othersource", "https://other.com", true).await.unwrap();

        let original = ParsedArticle::new("Owner", "https://test.com/shared", 3);
        storage.upsert_one(&original, &owner, Utc::now()).await.unwrap();

        let intruder = ParsedArticle::new("Intruder", "https://test.com/shared", 1)
            .with_summary(Some("nope".to_string()));
        let outcome = storage.upsert_one(&intruder, &other, Utc::now()).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Skipped);

        let stored = storage.find_by_url("https://test.com/shared").await.unwrap().unwrap();
        assert_eq!(stored.source_id, owner.id);
        assert_eq!(stored.headline, "Owner");
        assert_eq!(stored.position, 3);
        assert!(stored.description.is_none());
        assert!(storage.get_by_source(other.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_upsert_twice_updates_and_advances_last_seen() {
        let temp_dir = tempdir().unwrap();
        let storage = open_storage(&temp_dir).await;
        let source = storage.add_source("testsource", "https://test.com", true).await.unwrap();

        let first_seen = Utc::now();
        let counts = storage.bulk_upsert(&front_page(), &source, first_seen).await.unwrap();
        assert_eq!(counts, UpsertCounts { created: 2, updated: 0, skipped: 0 });

        let second_seen = first_seen + chrono::Duration::hours(1);
        let counts = storage.bulk_upsert(&front_page(), &source, second_seen).await.unwrap();
        assert_eq!(counts, UpsertCounts { created: 0, updated: 2, skipped: 0 });

        let articles = storage.get_by_source(source.id).await.unwrap();
        assert_eq!(articles.len(), 2);
        assert!(articles.iter().all(|a| a.last_seen_at == second_seen));
        assert!(articles.iter().all(|a| a.created_at <= a.updated_at));
    }

    #[tokio::test]
    async fn test_bulk_upsert_mixed_outcomes() {
        let temp_dir = tempdir().unwrap();
        let storage = open_storage(&temp_dir).await;
        let source = storage.add_source("testsource", "https://test.com", true).await.unwrap();
        let other = storage.add_source("othersource", "https://other.com", true).await.unwrap();

        storage
            .upsert_one(&ParsedArticle::new("Existing", "https://test.com/existing", 1), &source, Utc::now())
            .await
            .unwrap();
        storage
            .upsert_one(&ParsedArticle::new("Theirs", "https://test.com/theirs", 1), &other, Utc::now())
            .await
            .unwrap();

        let batch = vec![
            ParsedArticle::new("Existing again", "https://test.com/existing", 1),
            ParsedArticle::new("Brand new", "https://test.com/new", 2),
            ParsedArticle::new("Theirs", "https://test.com/theirs", 3),
            ParsedArticle::new("Brand new dup", "https://test.com/new", 4),
        ];
        let counts = storage.bulk_upsert(&batch, &source, Utc::now()).await.unwrap();
        assert_eq!(counts, UpsertCounts { created: 1, updated: 1, skipped: 2 });
    }

    #[tokio::test]
    async fn test_bulk_upsert_rolls_back_on_storage_error() {
        let temp_dir = tempdir().unwrap();
        let storage = open_storage(&temp_dir).await;
        let source = storage.add_source("testsource", "https://test.com", true).await.unwrap();
        storage.bulk_upsert(&front_page(), &source, Utc::now()).await.unwrap();

        // The second row violates the position check after the first has
        // already been written inside the transaction.
        let batch = vec![
            ParsedArticle::new("Changed", "https://test.com/one/", 1),
            ParsedArticle::new("Broken", "https://test.com/broken/", 0),
        ];
        let result = storage.bulk_upsert(&batch, &source, Utc::now()).await;
        assert!(matches!(result, Err(Error::Storage(_))));

        let one = storage.find_by_url("https://test.com/one/").await.unwrap().unwrap();
        assert_eq!(one.headline, "One");
        assert!(storage.find_by_url("https://test.com/broken/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_reconciles_url_stored_by_another_writer() {
        let temp_dir = tempdir().unwrap();
        let storage = open_storage(&temp_dir).await;
        let owner = storage.add_source("testsource", "https://test.com", true).await.unwrap();
        let other = storage.add_source("othersource", "https://other.com", true).await.unwrap();

        // Stored after our lookup would have found nothing.
        let stored = storage
            .upsert_one(&ParsedArticle::new("Owner", "https://test.com/raced", 5), &owner, Utc::now())
            .await
            .unwrap()
            .into_article()
            .unwrap();

        let mut tx = storage.pool.begin().await.unwrap();
        let same_source = ParsedArticle::new("Refreshed", "https://test.com/raced", 2);
        let outcome = create_article(&mut tx, &same_source, &owner, Utc::now()).await.unwrap();
        let updated = match outcome {
            UpsertOutcome::Updated(article) => article,
            other => panic!("expected update, got {other:?}"),
        };
        assert_eq!(updated.id, stored.id);

        let intruder = ParsedArticle::new("Intruder", "https://test.com/raced", 1);
        let outcome = create_article(&mut tx, &intruder, &other, Utc::now()).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Skipped);
        tx.commit().await.unwrap();

        let row = storage.find_by_url("https://test.com/raced").await.unwrap().unwrap();
        assert_eq!(row.id, stored.id);
        assert_eq!(row.source_id, owner.id);
        assert_eq!(row.headline, "Refreshed");
        assert_eq!(row.position, 2);
    }

    #[tokio::test]
    async fn test_bulk_upsert_empty_batch() {
        let temp_dir = tempdir().unwrap();
        let storage = open_storage(&temp_dir).await;
        let source = storage.add_source("testsource", "https://test.com", true).await.unwrap();
        let counts = storage.bulk_upsert(&[], &source, Utc::now()).await.unwrap();
        assert_eq!(counts, UpsertCounts::default());
    }
}
