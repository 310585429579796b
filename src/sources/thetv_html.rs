//! Channel-page scraper for providers that embed the schedule as `data-*`
//! attributes instead of serving the JSON endpoint.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::errors::{SourceError, SourceResult};
use crate::models::RawScheduleEntry;
use crate::sources::{ScheduleSource, normalize_base_url};
use crate::utils::ProviderHttpClient;

const SOURCE_TYPE: &str = "thetv_html";
const SLOT_SELECTOR: &str = "[data-listdatetime]";

pub struct TheTvHtmlSource {
    client: ProviderHttpClient,
    base_url: String,
}

impl TheTvHtmlSource {
    pub fn new(client: ProviderHttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }
}

fn attr(element: &ElementRef<'_>, name: &str) -> Option<String> {
    element.value().attr(name).map(|v| v.trim().to_string())
}

/// Extract every schedule slot from a channel page, in document order
pub fn parse_schedule_html(body: &str) -> SourceResult<Vec<RawScheduleEntry>> {
    let selector = Selector::parse(SLOT_SELECTOR)
        .map_err(|e| SourceError::decode(SOURCE_TYPE, format!("invalid selector: {e:?}")))?;
    let document = Html::parse_document(body);

    let entries = document
        .select(&selector)
        .map(|element| RawScheduleEntry {
            show_name: attr(&element, "data-showname").unwrap_or_default(),
            episode_title: attr(&element, "data-episodetitle"),
            start: attr(&element, "data-listdatetime").unwrap_or_default(),
            duration: attr(&element, "data-duration").unwrap_or_default(),
            description: attr(&element, "data-description"),
        })
        .collect();

    Ok(entries)
}

#[async_trait]
impl ScheduleSource for TheTvHtmlSource {
    fn source_type(&self) -> &'static str {
        SOURCE_TYPE
    }

    async fn fetch_schedule(
        &self,
        channel_id: &str,
        routing_path: &str,
    ) -> SourceResult<Vec<RawScheduleEntry>> {
        let url = format!("{}{}", self.base_url, routing_path);
        let referer = format!("{}/", self.base_url);
        let body = self.client.fetch_text(&url, Some(&referer)).await?;
        let entries = parse_schedule_html(&body)?;
        debug!("Channel '{}': {} raw entries scraped from {}", channel_id, entries.len(), url);
        Ok(entries)
    }
}
