use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    /// Page retrieval failed (network, timeout, navigation).
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("No parser registered for source: {0}")]
    ParserNotFound(String),

    #[error("Parser already registered for source: {0}")]
    DuplicateParser(String),

    /// A single source could not be scraped. Carries the source name so a
    /// multi-source run can report it and move on.
    #[error("Failed to scrape {source_name}: {message}")]
    Scraper { source_name: String, message: String },

    /// Underlying storage failure; the batch it happened in was rolled back.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn scraper(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scraper {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The message to show a user for this error, without the wrapping
    /// prefix. For `Fetch` and `Scraper` this is the underlying message.
    pub fn message(&self) -> String {
        match self {
            Self::Fetch { message, .. } | Self::Scraper { message, .. } => message.clone(),
            Self::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
