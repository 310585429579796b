//! Raw provider slot -> canonical schedule record

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::config::InvalidDurationPolicy;
use crate::errors::NormalizeError;
use crate::models::{RawScheduleEntry, ScheduleRecord};

/// Pure, synchronous normalizer shared by every channel task.
#[derive(Debug, Clone)]
pub struct ScheduleNormalizer {
    start_time_format: String,
    invalid_duration: InvalidDurationPolicy,
}

impl ScheduleNormalizer {
    pub fn new(
        start_time_format: impl Into<String>,
        invalid_duration: InvalidDurationPolicy,
    ) -> Self {
        Self {
            start_time_format: start_time_format.into(),
            invalid_duration,
        }
    }

    pub fn normalize(
        &self,
        channel_id: &str,
        entry: &RawScheduleEntry,
    ) -> Result<ScheduleRecord, NormalizeError> {
        let start = parse_start(&entry.start, &self.start_time_format)?;
        let minutes = parse_duration_minutes(&entry.duration, self.invalid_duration)?;
        let end = TimeDelta::try_minutes(minutes)
            .and_then(|delta| start.checked_add_signed(delta))
            .ok_or_else(|| NormalizeError::EndOutOfRange {
                start: entry.start.clone(),
                minutes,
            })?;

        Ok(ScheduleRecord {
            channel_id: channel_id.to_string(),
            start,
            end,
            title: compose_title(&entry.show_name, entry.episode_title.as_deref()),
            description: entry.description.clone().unwrap_or_default(),
        })
    }
}

/// `show`, or `show - episode` when an episode title is present
pub fn compose_title(show_name: &str, episode_title: Option<&str>) -> String {
    match episode_title {
        Some(episode) if !episode.is_empty() => format!("{show_name} - {episode}"),
        _ => show_name.to_string(),
    }
}

/// Parse with an offset-aware format, falling back to UTC for offset-less formats
fn parse_start(value: &str, format: &str) -> Result<DateTime<Utc>, NormalizeError> {
    DateTime::parse_from_str(value, format)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|offset_err| {
            NaiveDateTime::parse_from_str(value, format)
                .map(|naive| naive.and_utc())
                .map_err(|_| offset_err)
        })
        .map_err(|e| NormalizeError::TimeParse {
            value: value.to_string(),
            format: format.to_string(),
            message: e.to_string(),
        })
}

fn parse_duration_minutes(
    value: &str,
    policy: InvalidDurationPolicy,
) -> Result<i64, NormalizeError> {
    match value.trim().parse::<i64>() {
        Ok(minutes) => Ok(minutes),
        Err(_) => match policy {
            InvalidDurationPolicy::Zero => Ok(0),
            InvalidDurationPolicy::Skip => Err(NormalizeError::InvalidDuration {
                value: value.to_string(),
            }),
        },
    }
}
