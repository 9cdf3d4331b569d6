//! Poller - the driver loop
//!
//! Each round queries every tracked keyword, folds the fresh window into the
//! keyword's series and emits the ordered snapshot:
//! - fetch failures are logged and skip the merge, never merged as zeros
//! - different keywords may be fetched concurrently
//! - emission order follows keyword registration order

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use trends_client::SharedSource;
use trends_core::{records_for, KeywordStore, MergeKind, MergeReport, StoreError};

use crate::Emitter;

/// Poller configuration
pub struct PollerConfig {
    /// Window source (pre-constructed)
    pub source: SharedSource,
    /// Keywords to track, fixed for the process lifetime
    pub keywords: Vec<String>,
    /// Seconds between rounds
    pub poll_interval_secs: u64,
    /// Pause after each keyword query, in milliseconds
    pub query_delay_ms: u64,
    /// Stop after this many rounds (0 = unlimited)
    pub max_rounds: u64,
    /// Keywords fetched in parallel (1 = sequential)
    pub max_concurrent: usize,
    /// Attach UTC times to emitted records
    pub emit_utc: bool,
}

/// Result of one polling round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u64,
    /// Keywords whose window was merged
    pub merged: usize,
    /// Keywords whose fetch failed
    pub failed: usize,
    /// Points emitted across all keywords
    pub points: usize,
}

/// The polling driver
pub struct Poller {
    source: SharedSource,
    store: Arc<KeywordStore>,
    emitter: Box<dyn Emitter>,
    poll_interval_secs: u64,
    query_delay_ms: u64,
    max_rounds: u64,
    max_concurrent: usize,
    emit_utc: bool,
    rounds: u64,
}

impl Poller {
    /// Create a poller; the keyword store is built here, once
    pub fn new(config: PollerConfig, emitter: Box<dyn Emitter>) -> Result<Self, anyhow::Error> {
        if config.keywords.is_empty() {
            anyhow::bail!("no keywords to track");
        }
        if config.poll_interval_secs == 0 {
            anyhow::bail!("poll interval must be at least one second");
        }

        let store = Arc::new(KeywordStore::new(config.keywords));
        for keyword in store.keywords() {
            info!("Tracking: {}", keyword);
        }

        Ok(Self {
            source: config.source,
            store,
            emitter,
            poll_interval_secs: config.poll_interval_secs,
            query_delay_ms: config.query_delay_ms,
            max_rounds: config.max_rounds,
            max_concurrent: config.max_concurrent.max(1),
            emit_utc: config.emit_utc,
            rounds: 0,
        })
    }

    /// Shared handle to the keyword store
    pub fn store(&self) -> Arc<KeywordStore> {
        Arc::clone(&self.store)
    }

    /// Rounds completed so far
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Query, merge and emit every keyword once
    pub async fn poll_round(&mut self) -> Result<RoundSummary, anyhow::Error> {
        let delay = Duration::from_millis(self.query_delay_ms);
        let keywords = self.store.keywords().to_vec();

        let mut outcomes: Vec<(usize, String, Option<MergeReport>)> =
            stream::iter(keywords.into_iter().enumerate())
                .map(|(idx, keyword)| {
                    let source = Arc::clone(&self.source);
                    let store = Arc::clone(&self.store);
                    async move {
                        let outcome = poll_keyword(&source, &store, &keyword, delay).await;
                        outcome.map(|report| (idx, keyword, report))
                    }
                })
                .buffer_unordered(self.max_concurrent)
                .collect::<Vec<Result<_, StoreError>>>()
                .await
                .into_iter()
                .collect::<Result<_, _>>()?;
        outcomes.sort_by_key(|(idx, _, _)| *idx);

        self.rounds += 1;
        let mut summary = RoundSummary {
            round: self.rounds,
            ..Default::default()
        };

        for (_, keyword, report) in outcomes {
            if report.is_none() {
                summary.failed += 1;
                continue;
            }
            summary.merged += 1;

            let snapshot = self.store.snapshot_sorted(&keyword)?;
            let records = records_for(&keyword, &snapshot, self.emit_utc);
            summary.points += records.len();
            self.emitter.emit(&keyword, &records)?;
        }

        Ok(summary)
    }

    /// Poll on a fixed cadence until `max_rounds` is reached (or forever)
    pub async fn run(&mut self) -> Result<u64, anyhow::Error> {
        let mut ticker = interval(Duration::from_secs(self.poll_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Polling {} keywords from {} every {}s",
            self.store.len(),
            self.source.name(),
            self.poll_interval_secs
        );

        loop {
            ticker.tick().await;

            let summary = self.poll_round().await?;
            info!(
                "Round {}: {} merged, {} failed, {} points emitted",
                summary.round, summary.merged, summary.failed, summary.points
            );

            if self.max_rounds > 0 && self.rounds >= self.max_rounds {
                info!("Reached {} rounds, stopping", self.max_rounds);
                break;
            }
        }

        Ok(self.rounds)
    }
}

/// Fetch and merge one keyword. `Ok(None)` means the fetch failed and the series was left alone.
async fn poll_keyword(
    source: &SharedSource,
    store: &KeywordStore,
    keyword: &str,
    delay: Duration,
) -> Result<Option<MergeReport>, StoreError> {
    let outcome = match source.fetch_window(keyword).await {
        Ok(window) => {
            let report = store.merge(keyword, &window)?;
            log_report(keyword, &report);
            Some(report)
        }
        Err(e) => {
            warn!(
                "Fetch for '{}' from {} failed, keeping previous series: {}",
                keyword,
                source.name(),
                e
            );
            None
        }
    };

    if !delay.is_zero() {
        sleep(delay).await;
    }

    Ok(outcome)
}

fn log_report(keyword: &str, report: &MergeReport) {
    match report.kind {
        MergeKind::Baseline => {
            debug!("'{}': baseline of {} points", keyword, report.inserted);
        }
        MergeKind::Scaled => {
            debug!(
                "'{}': scale {:.4} from {}/{} overlap points, {} new, {} revised, {} pruned",
                keyword,
                report.scale,
                report.overlap.informative,
                report.overlap.shared,
                report.inserted,
                report.revised,
                report.pruned
            );
        }
        MergeKind::Unscaled => {
            warn!(
                "'{}': no usable overlap ({} shared points), {} points taken unscaled",
                keyword, report.overlap.shared, report.fallback
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryEmitter;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use trends_client::{TrendsError, WindowSource};
    use trends_core::RawWindow;

    /// Replays scripted fetch results per keyword
    #[derive(Default)]
    struct ScriptedSource {
        script: Mutex<HashMap<String, VecDeque<Result<RawWindow, TrendsError>>>>,
    }

    impl ScriptedSource {
        fn push(&self, keyword: &str, result: Result<RawWindow, TrendsError>) {
            self.script
                .lock()
                .entry(keyword.to_string())
                .or_default()
                .push_back(result);
        }
    }

    #[async_trait]
    impl WindowSource for ScriptedSource {
        async fn fetch_window(&self, keyword: &str) -> Result<RawWindow, TrendsError> {
            self.script
                .lock()
                .get_mut(keyword)
                .and_then(|queue| queue.pop_front())
                .unwrap_or_else(|| Err(TrendsError::EmptyWindow(keyword.to_string())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn poller(source: Arc<ScriptedSource>, keywords: &[&str], concurrency: usize) -> (Poller, MemoryEmitter) {
        let emitter = MemoryEmitter::new();
        let config = PollerConfig {
            source,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            poll_interval_secs: 600,
            query_delay_ms: 0,
            max_rounds: 2,
            max_concurrent: concurrency,
            emit_utc: false,
        };
        let poller = Poller::new(config, Box::new(emitter.clone())).unwrap();
        (poller, emitter)
    }

    fn values(emitter: &MemoryEmitter, keyword: &str) -> Vec<(i64, u32)> {
        emitter
            .latest(keyword)
            .unwrap_or_default()
            .iter()
            .map(|r| (r.timestamp, r.value))
            .collect()
    }

    #[test]
    fn test_requires_keywords() {
        let config = PollerConfig {
            source: Arc::new(ScriptedSource::default()),
            keywords: Vec::new(),
            poll_interval_secs: 600,
            query_delay_ms: 0,
            max_rounds: 0,
            max_concurrent: 1,
            emit_utc: false,
        };
        assert!(Poller::new(config, Box::new(MemoryEmitter::new())).is_err());
    }

    #[tokio::test]
    async fn test_rounds_stitch_windows() {
        let source = Arc::new(ScriptedSource::default());
        source.push("rust", Ok(RawWindow::from([(100, 50)])));
        source.push("rust", Ok(RawWindow::from([(100, 25), (200, 10)])));
        let (mut poller, emitter) = poller(source, &["rust"], 1);

        assert_eq!(poller.rounds(), 0);
        let first = poller.poll_round().await.unwrap();
        assert_eq!(first.merged, 1);
        assert_eq!(poller.rounds(), 1);
        assert_eq!(values(&emitter, "rust"), vec![(100, 50)]);

        let second = poller.poll_round().await.unwrap();
        assert_eq!(second.round, 2);
        assert_eq!(second.points, 2);
        assert_eq!(values(&emitter, "rust"), vec![(100, 50), (200, 20)]);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_series() {
        let source = Arc::new(ScriptedSource::default());
        source.push("rust", Ok(RawWindow::from([(100, 40), (200, 80)])));
        source.push("rust", Err(TrendsError::Status(500)));
        let (mut poller, emitter) = poller(source, &["rust"], 1);

        poller.poll_round().await.unwrap();
        let summary = poller.poll_round().await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.merged, 0);
        assert_eq!(emitter.blocks().len(), 1);
        assert_eq!(
            poller.store().snapshot_sorted("rust").unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_concurrent_round_emits_in_keyword_order() {
        let source = Arc::new(ScriptedSource::default());
        for (i, keyword) in ["a", "b", "c", "d"].iter().enumerate() {
            source.push(keyword, Ok(RawWindow::from([(1, i as u32)])));
        }
        let (mut poller, emitter) = poller(source, &["a", "b", "c", "d"], 4);

        let summary = poller.poll_round().await.unwrap();

        assert_eq!(summary.merged, 4);
        let order: Vec<_> = emitter.blocks().into_iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_after_max_rounds() {
        let source = Arc::new(ScriptedSource::default());
        source.push("rust", Ok(RawWindow::from([(1, 10), (2, 20)])));
        source.push("rust", Ok(RawWindow::from([(2, 10), (3, 30)])));
        let (mut poller, emitter) = poller(source, &["rust"], 1);

        let rounds = poller.run().await.unwrap();

        assert_eq!(rounds, 2);
        assert_eq!(poller.rounds(), 2);
        assert_eq!(values(&emitter, "rust"), vec![(2, 20), (3, 60)]);
    }
}
