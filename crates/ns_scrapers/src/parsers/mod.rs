use std::collections::HashSet;
use ns_core::{ParsedArticle, ParsedArticleData};
use scraper::{ElementRef, Html};
use thiserror::Error;
use tracing::{debug, warn};

pub mod argentina;
pub mod registry;
pub mod utils;

pub use registry::{ParserFactory, ParserRegistry};

/// Failure to extract a single article candidate. Logged and skipped by
/// [`parse_articles`], never returned to callers of [`SiteParser::parse`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ExtractionError(pub String);

impl ExtractionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A front-page parser for one news site.
///
/// Implementors only locate candidate elements and extract one article from
/// each. Skipping, deduplication and position numbering are handled by
/// [`parse_articles`] so every site behaves the same way.
pub trait SiteParser: Send + Sync {
    /// Registry name of the source this parser handles.
    fn source(&self) -> &str;

    /// Site root that relative links are resolved against.
    fn base_url(&self) -> &str;

    /// Hosts whose links count as articles of this site.
    fn allowed_hosts(&self) -> &[&str];

    fn build_document(&self, html: &str) -> Html {
        Html::parse_document(html)
    }

    /// Candidate article elements in document order.
    fn article_elements<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>>;

    /// Extract one article. `Ok(None)` means the element is not an article.
    fn parse_article_element(
        &self,
        element: ElementRef<'_>,
    ) -> Result<Option<ParsedArticleData>, ExtractionError>;

    /// Key used to drop repeated stories within one page.
    fn dedupe_key(&self, url: &str) -> String {
        url.to_string()
    }

    fn resolve_url(&self, href: &str) -> Option<String> {
        utils::resolve_url(self.base_url(), self.allowed_hosts(), href)
    }

    fn resolve_image_url(&self, src: &str) -> String {
        utils::resolve_image_url(self.base_url(), src)
    }

    fn parse(&self, html: &str) -> Vec<ParsedArticle> {
        parse_articles(self, html)
    }
}

/// Run a parser over a page and number the surviving articles 1..=N.
pub fn parse_articles<P: SiteParser + ?Sized>(parser: &P, html: &str) -> Vec<ParsedArticle> {
    let document = parser.build_document(html);
    let mut articles = Vec::new();
    let mut seen = HashSet::new();
    let mut position = 0u32;

    for (index, element) in parser.article_elements(&document).into_iter().enumerate() {
        let data = match parser.parse_article_element(element) {
            Ok(Some(data)) => data,
            Ok(None) => continue,
            Err(e) => {
                warn!(source = parser.source(), index, error = %e, "Failed to parse article element");
                continue;
            }
        };

        let title = data.title().trim();
        let url = data.url().trim();
        if title.is_empty() || url.is_empty() {
            continue;
        }

        if !seen.insert(parser.dedupe_key(url)) {
            debug!(source = parser.source(), url, "Skipping repeated article");
            continue;
        }

        position += 1;
        articles.push(
            ParsedArticle::new(title, url, position)
                .with_summary(clean_optional(data.get_summary()))
                .with_image_url(clean_optional(data.get_image_url())),
        );
    }

    debug!(source = parser.source(), count = articles.len(), "Parsed front page");
    articles
}

fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
