//! Channel roster persistence
//!
//! The roster is a YAML list of channels (`name`, `streamName`, `path`, `id`,
//! `logo`, `pathAlias`). A missing or empty file is an empty roster.

pub mod discovery;

use std::path::Path;

use tracing::{debug, info};

use crate::errors::{RosterError, RosterResult};
use crate::models::Channel;
use crate::pipeline::writer::atomic_write;

pub use discovery::RosterDiscovery;

/// Load the roster from `path`
pub async fn load_channels(path: &Path) -> RosterResult<Vec<Channel>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("{:?} not found, returning empty list", path);
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(RosterError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let channels = parse_roster(&contents).map_err(|e| RosterError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!("Loaded {} channels from {:?}", channels.len(), path);
    Ok(channels)
}

fn parse_roster(contents: &str) -> Result<Vec<Channel>, serde_yaml::Error> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    let channels: Option<Vec<Channel>> = serde_yaml::from_str(contents)?;
    Ok(channels.unwrap_or_default())
}

/// Atomically replace the roster at `path`
pub async fn save_channels(path: &Path, channels: &[Channel]) -> RosterResult<()> {
    let yaml = serde_yaml::to_string(channels).map_err(RosterError::Serialize)?;
    atomic_write(path, yaml.as_bytes()).await?;
    info!("Roster saved: {:?} ({} channels)", path, channels.len());
    Ok(())
}
