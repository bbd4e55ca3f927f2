/*!
 * Job progress tracking.
 *
 * A job moves through an explicit state machine (`JobState`) and every
 * change is recorded in a `ProgressTracker`. The HTTP layer and the
 * orchestrator share one tracker instance that is injected at start-up;
 * `InMemoryProgressStore` keeps records in process memory and drops them
 * after a TTL.
 */

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, de};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::ProgressError;

/// Shortest interval the background sweeper runs at
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle state of a translation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    NotFound,
    Starting,
    InProgress,
    Completed,
    Error,
}

impl JobState {
    /// Whether the transition table allows moving from `self` to `next`
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (NotFound, Starting)
                | (Starting, InProgress | Completed | Error)
                | (InProgress, InProgress | Completed | Error)
                | (Completed | Error, Starting)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Starting => "starting",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress snapshot returned to pollers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Percentage complete, 0-100
    pub progress: u8,

    pub status: JobState,

    pub message: String,

    /// Time of the last update; absent for unknown jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Record reported for ids the store does not know
    pub fn not_found() -> Self {
        Self {
            progress: 0,
            status: JobState::NotFound,
            message: "Job not found".to_string(),
            timestamp: None,
        }
    }
}

/// A requested change to a job's progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Any JSON number is accepted; it is rounded and clamped to 0-100
    #[serde(deserialize_with = "deserialize_progress")]
    pub progress: u32,
    pub status: JobState,
    #[serde(default)]
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(status: JobState, progress: u32, message: impl Into<String>) -> Self {
        Self {
            progress,
            status,
            message: message.into(),
        }
    }
}

fn deserialize_progress<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(de::Error::custom("progress must be a finite number"));
    }
    Ok(value.round().clamp(0.0, 100.0) as u32)
}

/// Keyed store of job progress, shared between producers and pollers
pub trait ProgressTracker: Send + Sync {
    /// Current record for a job, or the not-found record
    fn get(&self, job_id: &str) -> ProgressRecord;

    /// Apply an update, enforcing the job state transition table
    fn update(&self, job_id: &str, update: ProgressUpdate) -> Result<ProgressRecord, ProgressError>;
}

struct StoredRecord {
    record: ProgressRecord,
    touched: Instant,
}

/// Process-local progress store with TTL eviction
pub struct InMemoryProgressStore {
    records: RwLock<HashMap<String, StoredRecord>>,
    ttl: Duration,
}

impl InMemoryProgressStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Remove records not updated within the TTL, returning how many were dropped
    pub fn evict_expired(&self) -> usize {
        let mut records = self.records.write();
        let before = records.len();
        let ttl = self.ttl;
        records.retain(|_, stored| stored.touched.elapsed() < ttl);
        let evicted = before - records.len();
        if evicted > 0 {
            debug!("Evicted {} expired progress records", evicted);
        }
        evicted
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        let ttl = self.ttl;
        self.records
            .read()
            .values()
            .filter(|stored| stored.touched.elapsed() < ttl)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn a background task that sweeps expired records on an interval
    ///
    /// Intervals shorter than `MIN_SWEEP_INTERVAL` are raised to it.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        let every = every.max(MIN_SWEEP_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                store.evict_expired();
            }
        })
    }
}

impl ProgressTracker for InMemoryProgressStore {
    fn get(&self, job_id: &str) -> ProgressRecord {
        let records = self.records.read();
        match records.get(job_id) {
            Some(stored) if stored.touched.elapsed() < self.ttl => stored.record.clone(),
            _ => ProgressRecord::not_found(),
        }
    }

    fn update(&self, job_id: &str, update: ProgressUpdate) -> Result<ProgressRecord, ProgressError> {
        if update.progress > 100 {
            return Err(ProgressError::OutOfRange(update.progress));
        }

        let mut records = self.records.write();
        let current = match records.get(job_id) {
            Some(stored) if stored.touched.elapsed() < self.ttl => stored.record.status,
            _ => JobState::NotFound,
        };

        if !current.can_transition_to(update.status) {
            return Err(ProgressError::InvalidTransition {
                job_id: job_id.to_string(),
                from: current.to_string(),
                to: update.status.to_string(),
            });
        }

        let record = ProgressRecord {
            progress: update.progress as u8,
            status: update.status,
            message: update.message,
            timestamp: Some(Utc::now()),
        };
        records.insert(
            job_id.to_string(),
            StoredRecord {
                record: record.clone(),
                touched: Instant::now(),
            },
        );

        Ok(record)
    }
}

/// Tracker that mirrors a single job onto a terminal progress bar
pub struct ProgressBarTracker {
    bar: ProgressBar,
    inner: InMemoryProgressStore,
}

impl ProgressBarTracker {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self {
            bar,
            inner: InMemoryProgressStore::new(Duration::from_secs(24 * 60 * 60)),
        }
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl Default for ProgressBarTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker for ProgressBarTracker {
    fn get(&self, job_id: &str) -> ProgressRecord {
        self.inner.get(job_id)
    }

    fn update(&self, job_id: &str, update: ProgressUpdate) -> Result<ProgressRecord, ProgressError> {
        let record = self.inner.update(job_id, update)?;
        self.bar.set_position(record.progress as u64);
        self.bar.set_message(record.message.clone());
        if record.status.is_terminal() {
            self.bar.finish_with_message(record.message.clone());
        }
        Ok(record)
    }
}
