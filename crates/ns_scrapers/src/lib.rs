pub mod cli;
pub mod fetch;
pub mod logging;
pub mod manager;
pub mod parsers;
pub mod report;

pub use cli::{handle_command, ScraperArgs, ScraperCommands};
pub use fetch::{create_fetcher, HttpFetcher, PageFetcher};
pub use logging::init_logging;
pub use manager::{RunReport, ScraperManager, SourceReport};
pub use parsers::{parse_articles, ExtractionError, ParserRegistry, SiteParser};

pub mod prelude {
    pub use super::parsers::{ParserRegistry, SiteParser};
    pub use super::{PageFetcher, ScraperManager};
    pub use ns_core::{ParsedArticle, Result, Error};
}
