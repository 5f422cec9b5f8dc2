use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::sync::{SyncEngine, SyncSummary};

/// Lifecycle state of a background sync job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Running,
    Done,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Running)
    }
}

/// Pollable record of one background sync job
///
/// Written once at start (RUNNING) and once at completion (DONE or FAILED).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: Uuid,

    pub state: JobState,

    /// Present once the job is DONE
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SyncSummary>,

    /// Present once the job is FAILED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub started_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    fn running(id: Uuid) -> Self {
        Self {
            id,
            state: JobState::Running,
            result: None,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    fn complete(&mut self, outcome: Result<SyncSummary, String>) {
        match outcome {
            Ok(summary) => {
                self.state = JobState::Done;
                self.result = Some(summary);
            }
            Err(message) => {
                self.state = JobState::Failed;
                self.error = Some(message);
            }
        }
        self.finished_at = Some(Utc::now());
    }
}

/// How long finished job records stay pollable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRetention {
    /// Age past which a finished record is evicted
    pub ttl: Duration,
    /// Cap on finished records; the oldest are evicted first
    pub max_records: usize,
}

impl Default for JobRetention {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_records: 1000,
        }
    }
}

/// Runs sync passes as detached background jobs and tracks their state
///
/// Each `start` spawns an independent task; any number may run at once. Records
/// of finished jobs are evicted by age and count, running jobs never are.
#[derive(Clone)]
pub struct JobTracker {
    jobs: Arc<DashMap<Uuid, JobRecord>>,
    engine: Arc<SyncEngine>,
    retention: JobRetention,
}

impl JobTracker {
    pub fn new(engine: Arc<SyncEngine>, retention: JobRetention) -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            engine,
            retention,
        }
    }

    /// Start a full sync in the background and return its job id immediately
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> Uuid {
        self.evict_finished();

        let job_id = Uuid::new_v4();
        self.jobs.insert(job_id, JobRecord::running(job_id));

        let jobs = Arc::clone(&self.jobs);
        let engine = Arc::clone(&self.engine);

        tokio::spawn(async move {
            // The inner task isolates a panic in the pass from the bookkeeping below
            let outcome = match tokio::spawn(async move { engine.run_once().await }).await {
                Ok(Ok(summary)) => {
                    tracing::info!(
                        "✅ Job {} done: {}/{} updated",
                        job_id,
                        summary.updated,
                        summary.total_candidates
                    );
                    Ok(summary)
                }
                Ok(Err(e)) => {
                    tracing::error!("❌ Job {} failed: {}", job_id, e);
                    Err(e.to_string())
                }
                Err(e) => {
                    tracing::error!("❌ Job {} aborted: {}", job_id, e);
                    Err(format!("Job aborted: {}", e))
                }
            };

            match jobs.get_mut(&job_id) {
                Some(mut record) => record.complete(outcome),
                None => tracing::warn!("Job {} vanished before completion", job_id),
            }
        });

        tracing::info!("🚀 Job {} started", job_id);
        job_id
    }

    /// Current record of a job, if it is known
    pub fn status(&self, job_id: Uuid) -> Option<JobRecord> {
        self.evict_finished();
        self.jobs.get(&job_id).map(|r| r.value().clone())
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn evict_finished(&self) {
        let now = Utc::now();
        let ttl = self.retention.ttl;

        self.jobs.retain(|_, record| match record.finished_at {
            // A finish time in the future (clock skew) keeps the record
            Some(finished) => (now - finished).to_std().map_or(true, |age| age < ttl),
            None => true,
        });

        let mut finished: Vec<(DateTime<Utc>, Uuid)> = self
            .jobs
            .iter()
            .filter_map(|r| r.finished_at.map(|at| (at, r.id)))
            .collect();

        if finished.len() <= self.retention.max_records {
            return;
        }

        finished.sort();
        let excess = finished.len() - self.retention.max_records;
        for (_, id) in finished.into_iter().take(excess) {
            self.jobs.remove_if(&id, |_, r| r.state.is_terminal());
        }
        tracing::debug!("Evicted {} finished job records over the cap", excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Asset, AssetRepository, DatabaseError, InMemoryStore};
    use crate::quotes::{FetchOptions, Quote, QuoteClient};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::collections::HashMap;

    /// Every symbol quotes at 100 after a short delay
    struct SlowFlatClient {
        delay: Duration,
    }

    #[async_trait]
    impl QuoteClient for SlowFlatClient {
        async fn fetch_price(&self, _symbol: &str) -> Option<Quote> {
            tokio::time::sleep(self.delay).await;
            Quote::now(dec!(100))
        }

        async fn fetch_volume(&self, _symbol: &str) -> Option<Decimal> {
            None
        }

        async fn fetch_metrics(&self, _symbol: &str) -> HashMap<String, Value> {
            HashMap::new()
        }
    }

    struct BrokenAssets {
        panic: bool,
    }

    impl AssetRepository for BrokenAssets {
        fn find_active(&self) -> Result<Vec<Asset>, DatabaseError> {
            if self.panic {
                panic!("asset catalog corrupted");
            }
            Err(DatabaseError::QueryError("relation \"assets\" does not exist".to_string()))
        }

        fn find_by_id(&self, _asset_id: Uuid) -> Result<Option<Asset>, DatabaseError> {
            Ok(None)
        }
    }

    fn options() -> FetchOptions {
        FetchOptions {
            max_workers: 2,
            per_task_timeout: Duration::from_secs(1),
            inter_request_delay: Duration::ZERO,
        }
    }

    fn tracker_with_delay(delay: Duration, retention: JobRetention) -> (JobTracker, InMemoryStore) {
        let store = InMemoryStore::with_symbols(&["AAPL", "MSFT"]);
        let engine = SyncEngine::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(SlowFlatClient { delay }),
            options(),
        );
        (JobTracker::new(Arc::new(engine), retention), store)
    }

    fn broken_tracker(panic: bool) -> JobTracker {
        let engine = SyncEngine::new(
            Arc::new(BrokenAssets { panic }),
            Arc::new(InMemoryStore::new()),
            Arc::new(SlowFlatClient { delay: Duration::ZERO }),
            options(),
        );
        JobTracker::new(Arc::new(engine), JobRetention::default())
    }

    async fn wait_terminal(tracker: &JobTracker, job_id: Uuid) -> JobRecord {
        for _ in 0..200 {
            if let Some(record) = tracker.status(job_id) {
                if record.state.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish", job_id);
    }

    #[tokio::test]
    async fn test_start_returns_before_the_pass_finishes() {
        let (tracker, _store) =
            tracker_with_delay(Duration::from_millis(300), JobRetention::default());

        let job_id = tracker.start();
        let record = tracker.status(job_id).unwrap();

        assert_eq!(record.state, JobState::Running);
        assert!(record.result.is_none());
        assert!(record.finished_at.is_none());
    }

    #[tokio::test]
    async fn test_job_completes_with_summary() {
        let (tracker, store) = tracker_with_delay(Duration::from_millis(20), JobRetention::default());

        let job_id = tracker.start();
        let record = wait_terminal(&tracker, job_id).await;

        assert_eq!(record.state, JobState::Done);
        let summary = record.result.clone().unwrap();
        assert_eq!(summary.total_candidates, 2);
        assert_eq!(summary.updated, 2);
        assert!(record.error.is_none());
        assert!(record.finished_at.is_some());
        assert_eq!(store.price_count(), 2);

        // Terminal state is stable
        assert_eq!(tracker.status(job_id), Some(record));
    }

    #[tokio::test]
    async fn test_failed_pass_is_recorded() {
        let tracker = broken_tracker(false);

        let job_id = tracker.start();
        let record = wait_terminal(&tracker, job_id).await;

        assert_eq!(record.state, JobState::Failed);
        assert!(record.error.unwrap().contains("does not exist"));
        assert!(record.result.is_none());
    }

    #[tokio::test]
    async fn test_panicking_pass_is_recorded_as_failed() {
        let tracker = broken_tracker(true);

        let job_id = tracker.start();
        let record = wait_terminal(&tracker, job_id).await;

        assert_eq!(record.state, JobState::Failed);
        assert!(record.error.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_jobs_are_independent() {
        let (tracker, _store) = tracker_with_delay(Duration::from_millis(50), JobRetention::default());

        let first = tracker.start();
        let second = tracker.start();
        assert_ne!(first, second);

        assert_eq!(wait_terminal(&tracker, first).await.state, JobState::Done);
        assert_eq!(wait_terminal(&tracker, second).await.state, JobState::Done);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let (tracker, _store) = tracker_with_delay(Duration::ZERO, JobRetention::default());
        assert!(tracker.status(Uuid::new_v4()).is_none());
    }

    #[tokio::test]
    async fn test_finished_jobs_expire_after_ttl() {
        let retention = JobRetention {
            ttl: Duration::from_millis(100),
            max_records: 100,
        };
        let (tracker, _store) = tracker_with_delay(Duration::ZERO, retention);

        let job_id = tracker.start();
        wait_terminal(&tracker, job_id).await;

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(tracker.status(job_id).is_none());
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_finished_jobs_are_capped_but_running_jobs_kept() {
        let retention = JobRetention {
            ttl: Duration::from_secs(3600),
            max_records: 1,
        };
        let (tracker, _store) = tracker_with_delay(Duration::ZERO, retention.clone());

        let first = tracker.start();
        wait_terminal(&tracker, first).await;
        let second = tracker.start();
        wait_terminal(&tracker, second).await;

        assert!(tracker.status(first).is_none());
        assert!(tracker.status(second).is_some());

        let (slow, _store) = tracker_with_delay(Duration::from_millis(300), retention);
        let running: Vec<Uuid> = (0..3).map(|_| slow.start()).collect();
        for id in &running {
            assert_eq!(slow.status(*id).map(|r| r.state), Some(JobState::Running));
        }
        assert_eq!(slow.len(), 3);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_record_serialization() {
        let mut record = JobRecord::running(Uuid::nil());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["state"], "RUNNING");
        assert!(json.get("result").is_none());
        assert!(json.get("finishedAt").is_none());

        record.complete(Ok(SyncSummary {
            total_candidates: 3,
            updated: 2,
            failed_symbols: vec!["ZZZZ".to_string()],
        }));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["state"], "DONE");
        assert_eq!(json["result"]["failedSymbols"][0], "ZZZZ");
        assert_eq!(json["result"]["totalCandidates"], 3);
    }
}
