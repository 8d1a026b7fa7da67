//! Reconciliation rules shared by every backend.
//!
//! - URL not stored yet: create it, owned by the scraping source.
//! - URL stored by the same source: update headline, description, image,
//!   position and `last_seen_at` in place.
//! - URL stored by a different source: leave it alone and skip.

use std::collections::HashSet;
use chrono::{DateTime, Utc};
use ns_core::{Article, ParsedArticle, Source};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertPlan {
    Create,
    Update,
    Conflict { existing_source_id: i64 },
}

pub fn plan_upsert(existing: Option<&Article>, source: &Source) -> UpsertPlan {
    match existing {
        None => UpsertPlan::Create,
        Some(article) if article.source_id == source.id => UpsertPlan::Update,
        Some(article) => UpsertPlan::Conflict {
            existing_source_id: article.source_id,
        },
    }
}

/// Drop repeated URLs from a batch, keeping the first occurrence.
/// Returns the unique articles and how many were dropped.
pub fn dedupe_batch(parsed: &[ParsedArticle]) -> (Vec<&ParsedArticle>, usize) {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(parsed.len());
    let mut duplicates = 0;

    for article in parsed {
        if seen.insert(article.url()) {
            unique.push(article);
        } else {
            debug!(
                url = article.url(),
                position = article.position(),
                "Skipping duplicate URL in batch"
            );
            duplicates += 1;
        }
    }

    (unique, duplicates)
}

/// Build the row for a first sighting. `id` is assigned by the backend.
pub fn new_article(id: i64, parsed: &ParsedArticle, source: &Source, seen_at: DateTime<Utc>) -> Article {
    let now = Utc::now();
    Article {
        id,
        headline: parsed.headline().to_string(),
        description: parsed.summary().map(str::to_string),
        url: parsed.url().to_string(),
        image_url: parsed.image_url().map(str::to_string),
        position: parsed.position(),
        source_id: source.id,
        last_seen_at: seen_at,
        created_at: now,
        updated_at: now,
    }
}

/// Refresh a stored article from a new sighting. `url`, `source_id` and
/// `created_at` never change.
pub fn apply_update(article: &mut Article, parsed: &ParsedArticle, seen_at: DateTime<Utc>) {
    article.headline = parsed.headline().to_string();
    article.description = parsed.summary().map(str::to_string);
    article.image_url = parsed.image_url().map(str::to_string);
    article.position = parsed.position();
    article.last_seen_at = seen_at;
    article.updated_at = Utc::now();
}

pub fn log_conflict(url: &str, existing_source_id: i64, new_source_id: i64) {
    warn!(
        url,
        existing_source_id,
        new_source_id,
        "Article URL already exists from different source"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: i64) -> Source {
        Source {
            id,
            name: format!("source{id}"),
            url: format!("https://source{id}.com"),
            logo_url: None,
            is_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_plan_upsert() {
        let owner = source(1);
        let other = source(2);
        let parsed = ParsedArticle::new("Headline", "https://source1.com/a/", 1);
        let stored = new_article(7, &parsed, &owner, Utc::now());

        assert_eq!(plan_upsert(None, &owner), UpsertPlan::Create);
        assert_eq!(plan_upsert(Some(&stored), &owner), UpsertPlan::Update);
        assert_eq!(
            plan_upsert(Some(&stored), &other),
            UpsertPlan::Conflict { existing_source_id: 1 }
        );
    }

    #[test]
    fn test_dedupe_batch_keeps_first() {
        let batch = vec![
            ParsedArticle::new("First", "https://x.com/a/", 1),
            ParsedArticle::new("Second", "https://x.com/a/", 2),
            ParsedArticle::new("Third", "https://x.com/b/", 3),
        ];
        let (unique, duplicates) = dedupe_batch(&batch);
        assert_eq!(duplicates, 1);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].headline(), "First");
        assert_eq!(unique[1].headline(), "Third");
    }

    #[test]
    fn test_apply_update_keeps_identity() {
        let owner = source(1);
        let first_seen = Utc::now();
        let original = ParsedArticle::new("Old", "https://source1.com/a/", 5)
            .with_summary(Some("old summary".to_string()));
        let mut stored = new_article(3, &original, &owner, first_seen);
        let created_at = stored.created_at;

        let later = first_seen + chrono::Duration::minutes(10);
        let refreshed = ParsedArticle::new("New", "https://source1.com/a/", 1);
        apply_update(&mut stored, &refreshed, later);

        assert_eq!(stored.id, 3);
        assert_eq!(stored.headline, "New");
        assert_eq!(stored.description, None);
        assert_eq!(stored.position, 1);
        assert_eq!(stored.last_seen_at, later);
        assert_eq!(stored.created_at, created_at);
        assert_eq!(stored.source_id, 1);
    }
}
