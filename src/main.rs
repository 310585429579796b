use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epg_aggregator::{
    config::Config,
    pipeline::{EpgPipeline, refresh_roster},
};

#[derive(Parser)]
#[command(name = "epg-aggregator")]
#[command(version)]
#[command(about = "Fetch every configured channel's schedule and write one XMLTV guide")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path (defaults to $CONFIG_FILE, then config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Output file (overrides config file)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Roster file (overrides config file)
    #[arg(short, long, value_name = "FILE")]
    roster: Option<PathBuf>,

    /// Rebuild the roster from the provider's channel index before aggregating
    #[arg(long)]
    refresh_roster: bool,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("epg_aggregator={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EPG update process (v{})", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load_from_file(path)?;
            info!("Configuration loaded from: {}", path);
            config
        }
        None => Config::load()?,
    };

    if let Some(output) = cli.output {
        config.output.path = output;
    }
    if let Some(roster) = cli.roster {
        config.roster.path = roster;
    }

    if cli.refresh_roster {
        let channels = refresh_roster(&config.source, &config.roster.path).await?;
        info!(
            "Roster refreshed: {} channels saved to {:?}",
            channels.len(),
            config.roster.path
        );
    }

    let pipeline = EpgPipeline::from_config(&config)?;
    match pipeline.run_from_roster(&config.roster.path).await {
        Ok(summary) => {
            info!(
                "EPG update completed successfully: {:?} ({} channels, {} programmes, \
                 {} failed channels)",
                summary.destination,
                summary.report.channels_succeeded,
                summary.report.entries_normalized,
                summary.report.channels_failed
            );
            Ok(())
        }
        Err(e) => {
            error!("Failed to update EPG XML: {}", e);
            Err(e.into())
        }
    }
}
