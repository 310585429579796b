//! Centralized error handling for the EPG aggregator
//!
//! Errors are split by the layer that produces them so the aggregation engine
//! can decide which failures stay local to one channel or entry and which ones
//! terminate the run.
//!
//! # Error Categories
//!
//! - **Source Errors**: one channel's fetch failed (network, status, decode)
//! - **Normalize Errors**: one schedule entry could not be normalized
//! - **Roster Errors**: the channel list could not be loaded or discovered
//! - **Persist Errors**: the guide could not be written to its destination
//!
//! # Usage
//!
//! ```rust
//! use epg_aggregator::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;

/// Convenience type alias for Roster Results
pub type RosterResult<T> = Result<T, RosterError>;
