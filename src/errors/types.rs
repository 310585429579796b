//! Error type definitions for the EPG aggregator

use std::path::PathBuf;

use thiserror::Error;

/// Top-level application error type
///
/// Only run-level fatal conditions end up here. Per-channel and per-entry
/// failures are logged by the aggregation engine and never surface as an
/// `AppError`.
#[derive(Error, Debug)]
pub enum AppError {
    /// The channel roster could not be loaded
    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),

    /// Every channel failed, nothing to write
    #[error("No valid channels found for EPG ({failed} of {requested} channels failed)")]
    EmptyAggregate { requested: usize, failed: usize },

    /// Writing the guide failed
    #[error("Persist error: {0}")]
    Persist(#[from] PersistError),

    /// Source construction errors (bad base URL, client build failure)
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Errors raised while fetching one channel's schedule
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport level failure (connect, timeout, body read)
    #[error("Request failed: {url} - {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-200 response from the provider
    #[error("HTTP error: {status} - {url}")]
    Http { status: u16, url: String },

    /// Response body could not be decoded into schedule entries
    #[error("Decode error: {source_type} - {message}")]
    Decode { source_type: String, message: String },

    /// Invalid source configuration
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfig { field: String, message: String },
}

/// Errors raised while normalizing one raw schedule entry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Start timestamp did not match the provider format
    #[error("Failed to parse start time '{value}' with format '{format}': {message}")]
    TimeParse {
        value: String,
        format: String,
        message: String,
    },

    /// Duration was not a number of minutes and the policy rejects it
    #[error("Invalid duration '{value}'")]
    InvalidDuration { value: String },

    /// start + duration fell outside the representable range
    #[error("End time out of range for start '{start}' plus {minutes} minutes")]
    EndOutOfRange { start: String, minutes: i64 },
}

/// Errors raised while loading or discovering the channel roster
#[derive(Error, Debug)]
pub enum RosterError {
    /// Reading or writing the roster file failed
    #[error("Roster I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The roster file was not valid YAML for a channel list
    #[error("Failed to parse roster {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Serializing the roster failed
    #[error("Failed to serialize roster: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// Channel discovery against the provider failed
    #[error("Channel discovery failed: {message}")]
    Discovery { message: String },

    /// Channel index could not be fetched
    #[error("Channel index fetch failed: {0}")]
    Source(#[from] SourceError),

    /// Saving the discovered roster failed
    #[error("Failed to save roster: {0}")]
    Persist(#[from] PersistError),
}

/// Errors raised while persisting a document to disk
#[derive(Error, Debug)]
pub enum PersistError {
    /// The document could not be rendered; nothing was written
    #[error("Serialization failed: {message}")]
    Serialize { message: String },

    /// Writing the temporary file failed; destination untouched
    #[error("Failed to write temporary file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Renaming the temporary file over the destination failed
    #[error("Failed to rename {from:?} to {to:?}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create a decode error for the given provider format
    pub fn decode<S: Into<String>, M: Into<String>>(source_type: S, message: M) -> Self {
        Self::Decode {
            source_type: source_type.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl PersistError {
    /// Underlying I/O error, if the failure came from the filesystem
    pub fn io_error(&self) -> Option<&std::io::Error> {
        match self {
            Self::Write { source, .. } | Self::Rename { source, .. } => Some(source),
            Self::Serialize { .. } => None,
        }
    }
}
