use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::config::{Config, SourceConfig};
use crate::errors::{AppError, AppResult};
use crate::models::Channel;
use crate::pipeline::{AggregationEngine, AggregationReport, DocumentWriter, ScheduleNormalizer};
use crate::roster::{self, RosterDiscovery};
use crate::sources::create_schedule_source;
use crate::utils::ProviderHttpClient;

/// Outcome of one successful run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: AggregationReport,
    pub destination: PathBuf,
    pub bytes_written: u64,
}

/// One complete aggregation run: roster in, guide on disk out
pub struct EpgPipeline {
    engine: AggregationEngine,
    writer: DocumentWriter,
}

impl EpgPipeline {
    pub fn new(engine: AggregationEngine, writer: DocumentWriter) -> Self {
        Self { engine, writer }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        config
            .validate()
            .map_err(|e| AppError::configuration(e.to_string()))?;
        let source = create_schedule_source(&config.source)?;
        let normalizer = ScheduleNormalizer::new(
            config.source.start_time_format.clone(),
            config.aggregation.invalid_duration,
        );
        let engine = AggregationEngine::new(source, normalizer)
            .with_max_concurrency(config.aggregation.max_concurrency);
        let writer =
            DocumentWriter::new(config.output.path.clone(), config.output.time_format.clone());
        Ok(Self::new(engine, writer))
    }

    /// Aggregate `channels` and persist the guide.
    ///
    /// Nothing is written when aggregation fails.
    pub async fn run(&self, channels: &[Channel]) -> AppResult<RunSummary> {
        let aggregation = self.engine.aggregate(channels).await?;
        let bytes_written = self.writer.write(&aggregation.document).await?;

        Ok(RunSummary {
            report: aggregation.report,
            destination: self.writer.destination().to_path_buf(),
            bytes_written,
        })
    }

    /// Load the roster, then [`run`](Self::run)
    pub async fn run_from_roster(&self, roster_path: &Path) -> AppResult<RunSummary> {
        let channels = roster::load_channels(roster_path).await?;
        info!("Loaded {} channels from {:?}", channels.len(), roster_path);
        self.run(&channels).await
    }
}

/// Scrape the provider's channel index and overwrite the roster file
pub async fn refresh_roster(source: &SourceConfig, roster_path: &Path) -> AppResult<Vec<Channel>> {
    let client = ProviderHttpClient::new(&source.user_agent, source.request_timeout)?;
    let discovery = Arc::new(RosterDiscovery::new(client, &source.base_url));
    let channels = discovery.discover().await?;
    roster::save_channels(roster_path, &channels).await?;
    Ok(channels)
}
