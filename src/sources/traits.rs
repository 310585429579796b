use async_trait::async_trait;

use crate::errors::SourceResult;
use crate::models::RawScheduleEntry;

/// Retrieves one channel's raw schedule from an external provider.
///
/// Implementations must be safe to call concurrently for different channels.
/// Each call carries its own request deadline; no retries are expected.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Short provider/format label used in logs and decode errors
    fn source_type(&self) -> &'static str;

    /// Fetch the raw entries for `channel_id`, routed through `routing_path`
    async fn fetch_schedule(
        &self,
        channel_id: &str,
        routing_path: &str,
    ) -> SourceResult<Vec<RawScheduleEntry>>;
}
