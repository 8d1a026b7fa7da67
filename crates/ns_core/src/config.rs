use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use crate::Error;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(30_000);

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_DATABASE_PATH: &str = "data/news_scraper.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    Memory,
    #[default]
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Config(format!(
                "Unknown storage backend: {} (expected memory or sqlite)",
                other
            ))),
        }
    }
}

/// Runtime settings shared by the binary and the library crates.
#[derive(Debug, Clone)]
pub struct Settings {
    pub storage: StorageKind,
    pub database_path: PathBuf,
    pub fetch_timeout: Duration,
    pub user_agent: String,
    /// Render pages with a headless browser instead of plain HTTP.
    pub use_browser: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage: StorageKind::default(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            use_browser: false,
        }
    }
}
