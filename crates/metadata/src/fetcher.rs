//! Page fetching seam. Production uses [`HttpPageFetcher`]; tests plug in
//! their own [`PageFetcher`].

use tracing::debug;

use crate::MetadataError;
use crate::agent::random_user_agent;

/// Fetches a page body as text.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, MetadataError>;
}

/// Plain HTTP fetcher. No retries and no request timeout.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, MetadataError> {
        debug!(url = %url, "page request");

        let mut req = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, random_user_agent());
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MetadataError::Network(format!(
                "{url} returned {}",
                resp.status()
            )));
        }

        resp.text()
            .await
            .map_err(|e| MetadataError::Network(format!("read body: {e}")))
    }
}
