use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use ns_core::{Error, Result, Settings};
use tracing::{debug, info};

#[cfg(feature = "browser")]
pub mod browser;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;

/// Retrieves the HTML of a page as a reader would see it.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, giving up after `timeout`. Failures, including timeouts,
    /// are reported as [`Error::Fetch`].
    async fn fetch_rendered_html(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// Plain HTTP fetcher. Good enough for sites that render their front page
/// on the server.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> reqwest::Result<String> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_rendered_html(&self, url: &str, timeout: Duration) -> Result<String> {
        info!(url, "Fetching page");
        let html = match tokio::time::timeout(timeout, self.get(url)).await {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => return Err(Error::fetch(url, e.to_string())),
            Err(_) => return Err(timeout_error(url, timeout)),
        };
        debug!(url, length = html.len(), "Fetched page");
        Ok(html)
    }
}

pub(crate) fn timeout_error(url: &str, timeout: Duration) -> Error {
    Error::fetch(url, format!("timed out after {} ms", timeout.as_millis()))
}

/// Build the fetcher selected by `settings`.
pub fn create_fetcher(settings: &Settings) -> Result<Arc<dyn PageFetcher>> {
    if settings.use_browser {
        #[cfg(feature = "browser")]
        {
            return Ok(Arc::new(BrowserFetcher::new(&settings.user_agent)));
        }
        #[cfg(not(feature = "browser"))]
        {
            return Err(Error::Config(
                "Browser fetching requires the `browser` feature".to_string(),
            ));
        }
    }
    Ok(Arc::new(HttpFetcher::new(&settings.user_agent)?))
}
