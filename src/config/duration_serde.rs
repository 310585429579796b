//! Serde helpers for human-readable durations in configuration.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer, de};

/// A duration as written in the config file
#[derive(Deserialize)]
#[serde(untagged)]
enum DurationValue {
    Seconds(u64),
    Text(String),
}

/// Serialize as a humantime string, deserialize from seconds or a humantime string
pub mod duration {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match DurationValue::deserialize(deserializer) {
            Ok(DurationValue::Seconds(seconds)) => Ok(Duration::from_secs(seconds)),
            Ok(DurationValue::Text(value)) => humantime::parse_duration(value.trim())
                .map_err(|e| de::Error::custom(format!("invalid duration '{value}': {e}"))),
            Err(_) => Err(de::Error::custom(
                "expected whole seconds or a duration such as '20s' or '1m30s'",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Wrapper {
        #[serde(with = "super::duration")]
        timeout: Duration,
    }

    #[test]
    fn test_human_readable_duration() {
        let parsed: Wrapper = toml::from_str(r#"timeout = "1m30s""#).unwrap();
        assert_eq!(parsed.timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_numeric_seconds() {
        let parsed: Wrapper = toml::from_str("timeout = 20").unwrap();
        assert_eq!(parsed.timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let parsed: Result<Wrapper, _> = toml::from_str(r#"timeout = "soon""#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_negative_seconds_rejected() {
        let parsed: Result<Wrapper, _> = toml::from_str("timeout = -5");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let out = toml::to_string(&Wrapper {
            timeout: Duration::from_secs(20),
        })
        .unwrap();
        assert!(out.contains("timeout = \"20s\""));
    }
}
