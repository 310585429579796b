//! Schedule providers
//!
//! Every provider-specific detail (URL layout, headers, body format) lives
//! behind [`ScheduleSource`]; the aggregation engine only ever sees
//! [`RawScheduleEntry`](crate::models::RawScheduleEntry) values.

pub mod factory;
pub mod thetv_html;
pub mod thetv_json;
pub mod traits;

pub use factory::create_schedule_source;
pub use thetv_html::TheTvHtmlSource;
pub use thetv_json::TheTvJsonSource;
pub use traits::ScheduleSource;

/// Prefix the provider puts in front of every channel slug
pub const CHANNEL_PATH_PREFIX: &str = "/channel/";

/// Channel slug used in schedule URLs, e.g. `/channel/abc-east` -> `abc-east`
pub fn schedule_slug(routing_path: &str) -> String {
    routing_path.replace(CHANNEL_PATH_PREFIX, "")
}

/// Base URL without a trailing slash so paths can be appended verbatim
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
