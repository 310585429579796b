use std::sync::Arc;

use tracing::info;

use crate::config::{SourceConfig, SourceFormat};
use crate::errors::{SourceError, SourceResult};
use crate::sources::{ScheduleSource, TheTvHtmlSource, TheTvJsonSource};
use crate::utils::ProviderHttpClient;

/// Build the configured schedule source
pub fn create_schedule_source(config: &SourceConfig) -> SourceResult<Arc<dyn ScheduleSource>> {
    url::Url::parse(&config.base_url)
        .map_err(|e| SourceError::invalid_config("source.base_url", e.to_string()))?;

    let client = ProviderHttpClient::new(&config.user_agent, config.request_timeout)?;

    let source: Arc<dyn ScheduleSource> = match config.format {
        SourceFormat::Json => Arc::new(TheTvJsonSource::new(client, &config.base_url)),
        SourceFormat::Html => Arc::new(TheTvHtmlSource::new(client, &config.base_url)),
    };

    info!(
        "Schedule source: {} (base_url={}, timeout={})",
        source.source_type(),
        config.base_url,
        humantime::format_duration(config.request_timeout)
    );
    Ok(source)
}
