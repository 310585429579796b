//! JSON schedule endpoint (`/tv_schedules/{slug}.json`)

use async_trait::async_trait;
use tracing::debug;

use crate::errors::{SourceError, SourceResult};
use crate::models::RawScheduleEntry;
use crate::sources::{ScheduleSource, normalize_base_url, schedule_slug};
use crate::utils::ProviderHttpClient;

const SOURCE_TYPE: &str = "thetv_json";

pub struct TheTvJsonSource {
    client: ProviderHttpClient,
    base_url: String,
}

impl TheTvJsonSource {
    pub fn new(client: ProviderHttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    fn schedule_url(&self, routing_path: &str) -> String {
        format!(
            "{}/tv_schedules/{}.json",
            self.base_url,
            schedule_slug(routing_path)
        )
    }

    fn referer(&self, routing_path: &str) -> String {
        format!("{}{}", self.base_url, routing_path)
    }
}

/// Decode a schedule body; `null` is an empty schedule
pub fn parse_schedule_json(body: &str) -> SourceResult<Vec<RawScheduleEntry>> {
    let entries: Option<Vec<RawScheduleEntry>> =
        serde_json::from_str(body).map_err(|e| SourceError::decode(SOURCE_TYPE, e.to_string()))?;
    Ok(entries.unwrap_or_default())
}

#[async_trait]
impl ScheduleSource for TheTvJsonSource {
    fn source_type(&self) -> &'static str {
        SOURCE_TYPE
    }

    async fn fetch_schedule(
        &self,
        channel_id: &str,
        routing_path: &str,
    ) -> SourceResult<Vec<RawScheduleEntry>> {
        let url = self.schedule_url(routing_path);
        let referer = self.referer(routing_path);
        let body = self.client.fetch_text(&url, Some(&referer)).await?;
        let entries = parse_schedule_json(&body)?;
        debug!("Channel '{}': {} raw entries from {}", channel_id, entries.len(), url);
        Ok(entries)
    }
}
