use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use ns_core::config::DEFAULT_FETCH_TIMEOUT;
use ns_core::validation::validate_slug;
use ns_core::{ArticleStore, Error, Result, ScrapeResult, Source, SourceStore, Storage};
use tracing::{error, info};
use crate::fetch::PageFetcher;
use crate::parsers::ParserRegistry;

/// Outcome of one source within a run.
#[derive(Debug)]
pub struct SourceReport {
    pub source_name: String,
    pub outcome: Result<ScrapeResult>,
}

impl SourceReport {
    fn failed(source_name: &str, error: Error) -> Self {
        Self {
            source_name: source_name.to_string(),
            outcome: Err(error),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub reports: Vec<SourceReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.reports.iter().all(|r| r.outcome.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &SourceReport> {
        self.reports.iter().filter(|r| r.outcome.is_err())
    }
}

/// Drives fetch, parse and persist for each source.
pub struct ScraperManager {
    storage: Arc<dyn Storage>,
    fetcher: Arc<dyn PageFetcher>,
    registry: ParserRegistry,
    fetch_timeout: Duration,
}

impl ScraperManager {
    pub fn new(storage: Arc<dyn Storage>, fetcher: Arc<dyn PageFetcher>, registry: ParserRegistry) -> Self {
        Self {
            storage,
            fetcher,
            registry,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Scrape one source's front page and persist what was found.
    /// Every failure comes back as [`Error::Scraper`] naming the source.
    pub async fn scrape(&self, source: &Source) -> Result<ScrapeResult> {
        info!(source = %source.name, url = %source.url, "Scraping source");

        let html = self
            .fetcher
            .fetch_rendered_html(&source.url, self.fetch_timeout)
            .await
            .map_err(|e| Error::scraper(&source.name, e.message()))?;

        let parser = self
            .registry
            .get(&source.name)
            .map_err(|e| Error::scraper(&source.name, e.to_string()))?;
        let articles = parser.parse(&html);

        let counts = self
            .storage
            .bulk_upsert(&articles, source, Utc::now())
            .await
            .map_err(|e| Error::scraper(&source.name, e.to_string()))?;

        info!(
            source = %source.name,
            found = articles.len(),
            created = counts.created,
            updated = counts.updated,
            skipped = counts.skipped,
            "Scraped source"
        );
        Ok(ScrapeResult::new(articles, counts))
    }

    /// Turn requested names into sources to scrape. Names that are invalid,
    /// unknown or disabled come back as failed reports instead.
    pub async fn resolve_sources(&self, names: &[String]) -> Result<(Vec<Source>, Vec<SourceReport>)> {
        if names.is_empty() {
            let sources = self.storage.list_enabled_sources().await?;
            if sources.is_empty() {
                return Err(Error::Config("No enabled sources found".to_string()));
            }
            return Ok((sources, Vec::new()));
        }

        let mut sources = Vec::new();
        let mut rejected = Vec::new();
        let mut seen = HashSet::new();

        for name in names {
            let slug = match validate_slug(name, "source") {
                Ok(slug) => slug,
                Err(e) => {
                    rejected.push(SourceReport::failed(name, e));
                    continue;
                }
            };
            if !seen.insert(slug.clone()) {
                continue;
            }

            match self.storage.find_source_by_name(&slug).await? {
                Some(source) if source.is_enabled => sources.push(source),
                Some(_) => rejected.push(SourceReport::failed(
                    &slug,
                    Error::scraper(&slug, "Source is disabled"),
                )),
                None => rejected.push(SourceReport::failed(
                    &slug,
                    Error::scraper(&slug, "Source not found"),
                )),
            }
        }

        Ok((sources, rejected))
    }

    /// Scrape sources one after another. A failing source is reported and
    /// the run moves on.
    pub async fn scrape_sources(&self, sources: &[Source]) -> RunReport {
        let mut report = RunReport::default();
        for source in sources {
            let outcome = self.scrape(source).await;
            if let Err(e) = &outcome {
                error!(source = %source.name, error = %e, "Scrape failed");
            }
            report.reports.push(SourceReport {
                source_name: source.name.clone(),
                outcome,
            });
        }
        report
    }

    /// Scrape the named sources, or every enabled source when `names` is
    /// empty. Rejected names are listed first in the report.
    pub async fn run(&self, names: &[String]) -> Result<RunReport> {
        let (sources, rejected) = self.resolve_sources(names).await?;
        for failure in &rejected {
            if let Err(e) = &failure.outcome {
                error!(source = %failure.source_name, error = %e, "Skipping source");
            }
        }

        let mut report = RunReport { reports: rejected };
        report.reports.extend(self.scrape_sources(&sources).await.reports);
        Ok(report)
    }
}
