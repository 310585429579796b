use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One configured channel as stored in the roster file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(rename = "name", default)]
    pub display_name: String,
    #[serde(default)]
    pub stream_name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub path_alias: String,
}

impl Channel {
    /// Routing path used for schedule requests; a non-empty alias wins
    pub fn effective_path(&self) -> &str {
        if self.path_alias.is_empty() {
            &self.path
        } else {
            &self.path_alias
        }
    }
}

/// A programming slot exactly as the provider reported it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScheduleEntry {
    #[serde(rename = "data-showname", default, deserialize_with = "null_as_empty")]
    pub show_name: String,
    #[serde(rename = "data-episodetitle", default)]
    pub episode_title: Option<String>,
    #[serde(rename = "data-listdatetime", default, deserialize_with = "null_as_empty")]
    pub start: String,
    #[serde(rename = "data-duration", default, deserialize_with = "null_as_empty")]
    pub duration: String,
    #[serde(rename = "data-description", default)]
    pub description: Option<String>,
}

/// Providers send `null` for unknown values; treat it like a missing key
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Normalized programme slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRecord {
    pub channel_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub id: String,
    pub display_name: String,
}

impl From<&Channel> for ChannelEntry {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id.clone(),
            display_name: channel.display_name.clone(),
        }
    }
}

/// The aggregated guide: channels and programmes in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpgDocument {
    pub channels: Vec<ChannelEntry>,
    pub programmes: Vec<ScheduleRecord>,
}

impl EpgDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one channel together with its records.
    ///
    /// Records must belong to `entry`; anything tagged with another channel id
    /// would break the document invariant and is rejected in debug builds.
    pub fn push_channel(&mut self, entry: ChannelEntry, records: Vec<ScheduleRecord>) {
        debug_assert!(records.iter().all(|r| r.channel_id == entry.id));
        self.channels.push(entry);
        self.programmes.extend(records);
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Records belonging to one channel, in document order
    pub fn programmes_for<'a>(
        &'a self,
        channel_id: &'a str,
    ) -> impl Iterator<Item = &'a ScheduleRecord> + 'a {
        self.programmes
            .iter()
            .filter(move |p| p.channel_id == channel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_path_prefers_alias() {
        let mut channel = Channel {
            id: "abc".to_string(),
            path: "/channel/abc".to_string(),
            ..Default::default()
        };
        assert_eq!(channel.effective_path(), "/channel/abc");

        channel.path_alias = "/channel/abc-east".to_string();
        assert_eq!(channel.effective_path(), "/channel/abc-east");
    }

    #[test]
    fn test_channel_roster_keys() {
        let yaml = r#"
- name: ABC East
  streamName: abc-east
  path: /channel/abc-east
  id: abc-east
  logo: ""
  pathAlias: /channel/abc
"#;
        let channels: Vec<Channel> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].display_name, "ABC East");
        assert_eq!(channels[0].stream_name, "abc-east");
        assert_eq!(channels[0].path_alias, "/channel/abc");
    }

    #[test]
    fn test_raw_entry_tolerates_missing_keys() {
        let json = r#"[{
            "data-showname": "News",
            "data-listdatetime": "2025-01-01T10:00:00+00:00",
            "data-duration": "30"
        }]"#;
        let entries: Vec<RawScheduleEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].show_name, "News");
        assert_eq!(entries[0].episode_title, None);
        assert_eq!(entries[0].description, None);
    }

    #[test]
    fn test_raw_entry_reads_null_values_as_empty() {
        let json = r#"{
            "data-showname": null,
            "data-episodetitle": null,
            "data-listdatetime": null,
            "data-duration": null,
            "data-description": null
        }"#;
        let entry: RawScheduleEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry, RawScheduleEntry::default());
    }
}
