/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Output defaults
pub const DEFAULT_OUTPUT_PATH: &str = "epg.xml";
pub const DEFAULT_OUTPUT_TIME_FORMAT: &str = "%Y%m%d%H%M%S %z";

// Source defaults
pub const DEFAULT_BASE_URL: &str = "https://thetvapp.to";
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
);
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_START_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

// Aggregation defaults (0 = one in-flight fetch per channel)
pub const DEFAULT_MAX_CONCURRENCY: usize = 0;

// Roster defaults
pub const DEFAULT_ROSTER_PATH: &str = "tvList.yaml";
