//! Concurrent per-channel fetch and merge
//!
//! One task is spawned per channel. Tasks never touch the document: each one
//! fetches and normalizes its own channel and hands back a completed
//! [`ChannelOutcome`]. The engine is the only owner of the results and stores
//! each outcome in its roster slot as tasks finish, so no lock is needed and
//! no I/O or parsing happens while merging. Once every task has joined, the
//! [`EpgDocument`] is assembled in roster order, which keeps the output stable
//! from one run to the next regardless of completion order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::models::{Channel, ChannelEntry, EpgDocument, ScheduleRecord};
use crate::pipeline::normalizer::ScheduleNormalizer;
use crate::sources::ScheduleSource;

/// Result of one channel task
#[derive(Debug)]
pub enum ChannelOutcome {
    Fetched {
        entry: ChannelEntry,
        records: Vec<ScheduleRecord>,
        skipped_entries: usize,
    },
    Failed {
        channel_id: String,
    },
}

/// Counters describing how a run went
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationReport {
    pub channels_requested: usize,
    pub channels_succeeded: usize,
    pub channels_failed: usize,
    pub entries_normalized: usize,
    pub entries_skipped: usize,
    /// Ids of channels that contributed nothing, in roster order
    pub failed_channels: Vec<String>,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct Aggregation {
    pub document: EpgDocument,
    pub report: AggregationReport,
}

pub struct AggregationEngine {
    source: Arc<dyn ScheduleSource>,
    normalizer: Arc<ScheduleNormalizer>,
    max_concurrency: usize,
}

impl AggregationEngine {
    pub fn new(source: Arc<dyn ScheduleSource>, normalizer: ScheduleNormalizer) -> Self {
        Self {
            source,
            normalizer: Arc::new(normalizer),
            max_concurrency: 0,
        }
    }

    /// Cap the number of channels fetched at once; 0 removes the cap
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Fetch every channel and merge the results.
    ///
    /// Returns only after every channel task has finished. Fails with
    /// [`AppError::EmptyAggregate`] when no channel produced an entry.
    pub async fn aggregate(&self, channels: &[Channel]) -> AppResult<Aggregation> {
        let started = Instant::now();
        let limiter = (self.max_concurrency > 0)
            .then(|| Arc::new(Semaphore::new(self.max_concurrency)));

        info!(
            "Aggregating {} channels from {} (max_concurrency={})",
            channels.len(),
            self.source.source_type(),
            if self.max_concurrency == 0 {
                "unbounded".to_string()
            } else {
                self.max_concurrency.to_string()
            }
        );

        let mut tasks = JoinSet::new();
        let mut task_positions: HashMap<task::Id, usize> = HashMap::with_capacity(channels.len());
        for (position, channel) in channels.iter().enumerate() {
            let channel = channel.clone();
            let source = Arc::clone(&self.source);
            let normalizer = Arc::clone(&self.normalizer);
            let limiter = limiter.clone();

            let handle = tasks.spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(e) => {
                            warn!("Concurrency limiter closed for channel {}: {}", channel.id, e);
                            return (
                                position,
                                ChannelOutcome::Failed {
                                    channel_id: channel.id,
                                },
                            );
                        }
                    },
                    None => None,
                };
                (position, process_channel(&channel, source.as_ref(), &normalizer).await)
            });
            task_positions.insert(handle.id(), position);
        }

        let mut report = AggregationReport {
            channels_requested: channels.len(),
            ..Default::default()
        };
        let mut slots: Vec<Option<(ChannelEntry, Vec<ScheduleRecord>)>> =
            (0..channels.len()).map(|_| None).collect();
        let mut failed_positions = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((
                    position,
                    ChannelOutcome::Fetched {
                        entry,
                        records,
                        skipped_entries,
                    },
                )) => {
                    report.channels_succeeded += 1;
                    report.entries_normalized += records.len();
                    report.entries_skipped += skipped_entries;
                    slots[position] = Some((entry, records));
                }
                Ok((position, ChannelOutcome::Failed { channel_id })) => {
                    debug!("Channel {} contributed nothing", channel_id);
                    report.channels_failed += 1;
                    failed_positions.push(position);
                }
                Err(join_error) => {
                    report.channels_failed += 1;
                    match task_positions.get(&join_error.id()) {
                        Some(&position) => {
                            warn!(
                                "Skipping channel {} ({}): task aborted: {}",
                                channels[position].display_name, channels[position].id, join_error
                            );
                            failed_positions.push(position);
                        }
                        None => warn!("Channel task aborted: {}", join_error),
                    }
                }
            }
        }

        failed_positions.sort_unstable();
        report.failed_channels = failed_positions
            .into_iter()
            .map(|position| channels[position].id.clone())
            .collect();
        report.elapsed = started.elapsed();

        let mut document = EpgDocument::new();
        for (entry, records) in slots.into_iter().flatten() {
            document.push_channel(entry, records);
        }

        if document.is_empty() {
            return Err(AppError::EmptyAggregate {
                requested: report.channels_requested,
                failed: report.channels_failed,
            });
        }

        info!(
            "Aggregation complete: channels={}/{} failed={} programmes={} skipped_entries={} \
             duration={}",
            report.channels_succeeded,
            report.channels_requested,
            report.channels_failed,
            report.entries_normalized,
            report.entries_skipped,
            humantime::format_duration(Duration::from_millis(report.elapsed.as_millis() as u64))
        );

        Ok(Aggregation { document, report })
    }
}

/// Fetch and normalize a single channel.
///
/// Fetch failures and per-entry normalization failures are logged here and
/// never escape as errors.
pub async fn process_channel(
    channel: &Channel,
    source: &dyn ScheduleSource,
    normalizer: &ScheduleNormalizer,
) -> ChannelOutcome {
    let path = channel.effective_path();

    let raw_entries = match source.fetch_schedule(&channel.id, path).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "Failed to fetch schedule for channel {} ({}): {}",
                channel.display_name, channel.id, e
            );
            return ChannelOutcome::Failed {
                channel_id: channel.id.clone(),
            };
        }
    };

    let mut records = Vec::with_capacity(raw_entries.len());
    let mut skipped_entries = 0;
    for raw in &raw_entries {
        match normalizer.normalize(&channel.id, raw) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped_entries += 1;
                warn!(
                    "Skipping entry '{}' on channel {}: {}",
                    raw.show_name, channel.id, e
                );
            }
        }
    }

    debug!(
        "Channel {} ({}): {} records, {} skipped",
        channel.display_name,
        channel.id,
        records.len(),
        skipped_entries
    );

    ChannelOutcome::Fetched {
        entry: ChannelEntry::from(channel),
        records,
        skipped_entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InvalidDurationPolicy;
    use crate::config::defaults::DEFAULT_START_TIME_FORMAT;
    use crate::errors::{SourceError, SourceResult};
    use crate::models::RawScheduleEntry;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory source keyed by routing path
    #[derive(Default)]
    struct MockSource {
        schedules: HashMap<String, Vec<RawScheduleEntry>>,
        panics_on: HashSet<String>,
        delay: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        requested_paths: Mutex<Vec<String>>,
    }

    impl MockSource {
        fn with_schedule(mut self, path: &str, entries: Vec<RawScheduleEntry>) -> Self {
            self.schedules.insert(path.to_string(), entries);
            self
        }
    }

    #[async_trait]
    impl ScheduleSource for MockSource {
        fn source_type(&self) -> &'static str {
            "mock"
        }

        async fn fetch_schedule(
            &self,
            _channel_id: &str,
            routing_path: &str,
        ) -> SourceResult<Vec<RawScheduleEntry>> {
            self.requested_paths
                .lock()
                .unwrap()
                .push(routing_path.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.panics_on.contains(routing_path) {
                panic!("provider exploded for {routing_path}");
            }

            self.schedules
                .get(routing_path)
                .cloned()
                .ok_or_else(|| SourceError::Http {
                    status: 404,
                    url: routing_path.to_string(),
                })
        }
    }

    fn raw(show: &str, start: &str) -> RawScheduleEntry {
        RawScheduleEntry {
            show_name: show.to_string(),
            start: start.to_string(),
            duration: "30".to_string(),
            ..Default::default()
        }
    }

    fn channel(id: &str) -> Channel {
        Channel {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            path: format!("/channel/{id}"),
            ..Default::default()
        }
    }

    fn engine(source: MockSource) -> AggregationEngine {
        AggregationEngine::new(
            Arc::new(source),
            ScheduleNormalizer::new(DEFAULT_START_TIME_FORMAT, InvalidDurationPolicy::Zero),
        )
    }

    #[tokio::test]
    async fn test_failed_channels_are_skipped() {
        let source = MockSource::default()
            .with_schedule("/channel/a", vec![raw("A1", "2025-01-01T10:00:00+00:00")])
            .with_schedule("/channel/c", vec![raw("C1", "2025-01-01T10:00:00+00:00")]);
        let channels = vec![channel("a"), channel("b"), channel("c")];

        let result = engine(source).aggregate(&channels).await.unwrap();

        let ids: Vec<&str> = result.document.channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(result.document.programmes.iter().all(|p| p.channel_id != "b"));
        assert_eq!(result.report.channels_succeeded, 2);
        assert_eq!(result.report.channels_failed, 1);
        assert_eq!(result.report.failed_channels, vec!["b"]);
    }

    #[tokio::test]
    async fn test_document_follows_roster_order() {
        let mut source = MockSource::default();
        let channels: Vec<Channel> = ["z", "m", "a", "q"].iter().map(|id| channel(id)).collect();
        for c in &channels {
            source =
                source.with_schedule(&c.path, vec![raw(&c.id, "2025-01-01T10:00:00+00:00")]);
        }

        let result = engine(source).aggregate(&channels).await.unwrap();

        let ids: Vec<&str> = result.document.channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "m", "a", "q"]);
        let owners: Vec<&str> = result
            .document
            .programmes
            .iter()
            .map(|p| p.channel_id.as_str())
            .collect();
        assert_eq!(owners, vec!["z", "m", "a", "q"]);
    }

    #[tokio::test]
    async fn test_all_channels_failing_is_empty_aggregate() {
        let channels = vec![channel("a"), channel("b")];
        let err = engine(MockSource::default()).aggregate(&channels).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::EmptyAggregate {
                requested: 2,
                failed: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_roster_is_empty_aggregate() {
        let err = engine(MockSource::default()).aggregate(&[]).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyAggregate { requested: 0, .. }));
    }

    #[tokio::test]
    async fn test_bad_entry_skipped_channel_kept() {
        let source = MockSource::default().with_schedule(
            "/channel/a",
            vec![
                raw("First", "2025-01-01T10:00:00+00:00"),
                raw("Broken", "yesterday-ish"),
                raw("Third", "2025-01-01T11:00:00+00:00"),
            ],
        );

        let result = engine(source).aggregate(&[channel("a")]).await.unwrap();

        assert_eq!(result.document.channels.len(), 1);
        let titles: Vec<&str> =
            result.document.programmes.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Third"]);
        assert_eq!(result.report.entries_skipped, 1);
    }

    #[tokio::test]
    async fn test_channel_with_no_entries_still_listed() {
        let source = MockSource::default().with_schedule("/channel/quiet", Vec::new());
        let result = engine(source).aggregate(&[channel("quiet")]).await.unwrap();
        assert_eq!(result.document.channels.len(), 1);
        assert!(result.document.programmes.is_empty());
    }

    #[tokio::test]
    async fn test_alias_is_used_for_routing() {
        let source = Arc::new(MockSource::default().with_schedule(
            "/channel/abc-west",
            vec![raw("West", "2025-01-01T10:00:00+00:00")],
        ));
        let mut abc = channel("abc");
        abc.path_alias = "/channel/abc-west".to_string();

        let engine = AggregationEngine::new(
            source.clone(),
            ScheduleNormalizer::new(DEFAULT_START_TIME_FORMAT, InvalidDurationPolicy::Zero),
        );
        let result = engine.aggregate(&[abc]).await.unwrap();

        assert_eq!(result.document.channels[0].id, "abc");
        assert_eq!(result.document.programmes[0].channel_id, "abc");
        assert_eq!(*source.requested_paths.lock().unwrap(), vec!["/channel/abc-west"]);
    }

    #[tokio::test]
    async fn test_panicking_task_counts_as_failure() {
        let mut source = MockSource::default()
            .with_schedule("/channel/ok", vec![raw("Fine", "2025-01-01T10:00:00+00:00")]);
        source.panics_on.insert("/channel/boom".to_string());

        let result = engine(source)
            .aggregate(&[channel("boom"), channel("ok"), channel("missing")])
            .await
            .unwrap();

        assert_eq!(result.document.channels.len(), 1);
        assert_eq!(result.report.channels_failed, 2);
        assert_eq!(result.report.failed_channels, vec!["boom", "missing"]);
    }

    #[tokio::test]
    async fn test_max_concurrency_caps_in_flight_fetches() {
        let mut source = MockSource::default();
        let channels: Vec<Channel> = (0..6).map(|i| channel(&format!("c{i}"))).collect();
        for c in &channels {
            source = source.with_schedule(&c.path, vec![raw("Show", "2025-01-01T10:00:00+00:00")]);
        }
        source.delay = Some(Duration::from_millis(50));
        let source = Arc::new(source);

        let engine = AggregationEngine::new(
            source.clone(),
            ScheduleNormalizer::new(DEFAULT_START_TIME_FORMAT, InvalidDurationPolicy::Zero),
        )
        .with_max_concurrency(2);
        let result = engine.aggregate(&channels).await.unwrap();

        assert_eq!(result.document.channels.len(), 6);
        assert!(source.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_unbounded_fans_out_every_channel() {
        let mut source = MockSource::default();
        let channels: Vec<Channel> = (0..6).map(|i| channel(&format!("c{i}"))).collect();
        for c in &channels {
            source = source.with_schedule(&c.path, Vec::new());
        }
        source.delay = Some(Duration::from_millis(50));
        let source = Arc::new(source);

        let engine = AggregationEngine::new(
            source.clone(),
            ScheduleNormalizer::new(DEFAULT_START_TIME_FORMAT, InvalidDurationPolicy::Zero),
        );
        engine.aggregate(&channels).await.unwrap();

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 6);
    }
}
