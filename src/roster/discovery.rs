//! Rebuild the roster by scraping the provider's channel index.

use std::sync::Arc;

use regex::Regex;
use scraper::{Html, Selector};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::errors::{RosterError, RosterResult, SourceError, SourceResult};
use crate::models::Channel;
use crate::sources::{normalize_base_url, schedule_slug};
use crate::utils::ProviderHttpClient;

const INDEX_LINK_SELECTOR: &str = "#fallbackContent a";
const STREAM_NAME_PATTERN: &str = r#"id="stream_name" name="(.*?)""#;

pub struct RosterDiscovery {
    client: ProviderHttpClient,
    base_url: String,
}

impl RosterDiscovery {
    pub fn new(client: ProviderHttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    /// Fetch the index, then every channel page concurrently for its stream name.
    ///
    /// A channel whose page fails keeps an empty stream name. Fails only when
    /// the index yields no channels at all.
    pub async fn discover(self: Arc<Self>) -> RosterResult<Vec<Channel>> {
        let index = self.client.fetch_text(&format!("{}/", self.base_url), None).await?;
        let listed = parse_channel_index(&index, &self.base_url)?;
        info!("Channel index lists {} channels", listed.len());

        let mut tasks = JoinSet::new();
        for (position, channel) in listed.into_iter().enumerate() {
            let discovery = Arc::clone(&self);
            tasks.spawn(async move {
                let stream_name = match discovery.fetch_stream_name(&channel).await {
                    Ok(name) => name,
                    Err(e) => {
                        warn!("Error fetching stream name for {}: {}", channel.display_name, e);
                        String::new()
                    }
                };
                (position, Channel { stream_name, ..channel })
            });
        }

        let mut discovered = Vec::new();
        let mut failed_tasks = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => discovered.push(entry),
                Err(e) => {
                    failed_tasks += 1;
                    warn!("Discovery task aborted: {}", e);
                }
            }
        }

        if discovered.is_empty() {
            return Err(RosterError::Discovery {
                message: format!("failed to fetch any channel ids, errors: {failed_tasks}"),
            });
        }

        // Keep index order rather than completion order
        discovered.sort_by_key(|(position, _)| *position);
        Ok(discovered.into_iter().map(|(_, channel)| channel).collect())
    }

    async fn fetch_stream_name(&self, channel: &Channel) -> SourceResult<String> {
        let page = self
            .client
            .fetch_text(&format!("{}{}", self.base_url, channel.path), None)
            .await?;
        extract_stream_name(&page)?.ok_or_else(|| {
            SourceError::decode("channel_page", "failed to extract stream_name from page")
        })
    }
}

/// Channels linked from the index page, with `path` relative to `base_url`
pub fn parse_channel_index(html: &str, base_url: &str) -> RosterResult<Vec<Channel>> {
    let selector = Selector::parse(INDEX_LINK_SELECTOR).map_err(|e| RosterError::Discovery {
        message: format!("invalid selector: {e:?}"),
    })?;
    let document = Html::parse_document(html);

    let channels = document
        .select(&selector)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let path = href.replacen(base_url, "", 1);
            let name = link.text().collect::<String>().trim().to_string();
            Some(Channel {
                id: schedule_slug(&path),
                display_name: name,
                path,
                ..Default::default()
            })
        })
        .collect();

    Ok(channels)
}

/// Value of the hidden `stream_name` input, if the page has one
pub fn extract_stream_name(page: &str) -> SourceResult<Option<String>> {
    let re = Regex::new(STREAM_NAME_PATTERN)
        .map_err(|e| SourceError::invalid_config("stream_name_pattern", e.to_string()))?;
    Ok(re
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string()))
}
