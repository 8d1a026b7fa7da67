use std::time::Duration;
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use ns_core::{Error, Result};
use tracing::{debug, info, warn};
use super::{timeout_error, PageFetcher};

/// Renders pages in headless Chrome so client-side content is present in
/// the returned HTML. A browser is launched per call and always closed.
#[derive(Debug, Clone)]
pub struct BrowserFetcher {
    user_agent: String,
}

impl BrowserFetcher {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
        }
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch_rendered_html(&self, url: &str, timeout: Duration) -> Result<String> {
        info!(url, "Rendering page");
        let config = BrowserConfig::builder()
            .arg(format!("--user-agent={}", self.user_agent))
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .build()
            .map_err(|e| Error::fetch(url, e))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::fetch(url, e.to_string()))?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let rendered = tokio::time::timeout(timeout, async {
            let page = browser.new_page(url).await?;
            page.wait_for_navigation().await?;
            page.content().await
        })
        .await;

        if let Err(e) = browser.close().await {
            warn!(url, error = %e, "Failed to close browser");
        }
        events.abort();

        let html = match rendered {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => return Err(Error::fetch(url, e.to_string())),
            Err(_) => return Err(timeout_error(url, timeout)),
        };
        debug!(url, length = html.len(), "Rendered page");
        Ok(html)
    }
}
