use std::time::Duration;

use reqwest::{Client, StatusCode, header};
use tracing::debug;

use crate::errors::{SourceError, SourceResult};

/// HTTP client shared by every provider request in a run.
///
/// Sends a fixed User-Agent, applies one total deadline per request and only
/// accepts `200 OK`.
#[derive(Clone)]
pub struct ProviderHttpClient {
    client: Client,
}

impl ProviderHttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> SourceResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::invalid_config("http_client", e.to_string()))?;

        Ok(Self { client })
    }

    /// GET `url` and return the body as text
    pub async fn fetch_text(&self, url: &str, referer: Option<&str>) -> SourceResult<String> {
        debug!("Fetching {}", url);

        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }

        let response = request.send().await.map_err(|e| SourceError::Request {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| SourceError::Request {
            url: url.to_string(),
            source: e,
        })?;

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
