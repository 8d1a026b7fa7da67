pub mod config;
pub mod error;
pub mod storage;
pub mod types;
pub mod validation;

pub use config::{Settings, StorageKind};
pub use error::{Error, Result};
pub use storage::{ArticleStore, SourceStore, Storage};
pub use types::{
    Article, ParsedArticle, ParsedArticleData, ScrapeResult, Source, UpsertCounts, UpsertOutcome,
    DEFAULT_SOURCES,
};
