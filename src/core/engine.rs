use crate::core::blocklist::Blocklist;
use crate::core::reconcile::{self, MergeOutcome};
use crate::core::store::SnapshotStore;
use crate::core::{ConfigProvider, FeedSource, Storage};
use crate::domain::model::{
    DiscardPolicy, FeedRecord, JobBoard, JobPosting, ReconcileOutcome, ReconcileReport,
    SessionMarkSet,
};
use crate::utils::error::{Result, TrackerError};
use chrono::Utc;
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns one page session: the snapshot handle, the feed, and the marks made
/// since the session started.
///
/// Every operation takes `&mut self`, so a toggle can never interleave with an
/// outstanding reconcile. Share an engine between tasks behind a
/// `tokio::sync::Mutex` to keep that guarantee.
pub struct ReconciliationEngine<S: Storage, F: FeedSource> {
    store: SnapshotStore<S>,
    feed: F,
    blocklist: Blocklist,
    policy: DiscardPolicy,
    fetch_timeout: Duration,
    session: SessionMarkSet,
}

impl<S: Storage, F: FeedSource> ReconciliationEngine<S, F> {
    pub fn new(
        store: SnapshotStore<S>,
        feed: F,
        blocklist: Blocklist,
        policy: DiscardPolicy,
    ) -> Self {
        Self {
            store,
            feed,
            blocklist,
            policy,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            session: SessionMarkSet::new(),
        }
    }

    /// Wires the snapshot slot, blocklist, policy and fetch timeout from `config`.
    pub fn from_config<C: ConfigProvider>(storage: S, feed: F, config: &C) -> Self {
        Self::new(
            SnapshotStore::new(storage, config.snapshot_key()),
            feed,
            Blocklist::new(config.blocklist()),
            config.discard_policy(),
        )
        .with_fetch_timeout(Duration::from_secs(config.fetch_timeout_secs()))
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn policy(&self) -> DiscardPolicy {
        self.policy
    }

    pub fn session_marks(&self) -> &SessionMarkSet {
        &self.session
    }

    /// Combines the stored snapshot with the feed and persists the result.
    ///
    /// Never fails: an unreadable snapshot counts as absent, an unavailable
    /// feed falls back to the snapshot filtered by the discard policy.
    pub async fn reconcile(&mut self) -> ReconcileReport {
        tracing::debug!(
            policy = %self.policy,
            blocklist = ?self.blocklist.patterns(),
            "Starting reconciliation"
        );
        let prior = self.load_prior().await;

        let report = match self.fetch_feed().await {
            Ok(feed) => {
                tracing::debug!("Fetched {} feed records", feed.len());
                let merged = reconcile::merge(prior, feed, &self.blocklist, self.policy);
                self.persist(&merged.jobs).await;
                Self::report_from(merged)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    suggestion = e.recovery_suggestion(),
                    "Feed unavailable, continuing with the stored job set"
                );
                let had_prior = prior.is_some();
                let (jobs, discarded) =
                    reconcile::apply_discard_policy(prior.unwrap_or_default(), self.policy);
                let (jobs, duplicates) = reconcile::dedup_by_apply_url(jobs);
                if had_prior {
                    self.persist(&jobs).await;
                }
                ReconcileReport {
                    retained: jobs.len(),
                    jobs,
                    outcome: ReconcileOutcome::FeedFallback,
                    introduced: 0,
                    discarded,
                    blocked: 0,
                    duplicates,
                    reconciled_at: Utc::now(),
                }
            }
        };

        self.session.retain_marked(&report.jobs);

        tracing::info!(
            outcome = ?report.outcome,
            total = report.jobs.len(),
            retained = report.retained,
            introduced = report.introduced,
            discarded = report.discarded,
            blocked = report.blocked,
            duplicates = report.duplicates,
            "Reconciliation finished"
        );
        report
    }

    /// Flips `marked` on the posting with `id` and persists the whole set.
    /// An unknown id leaves `jobs` untouched and writes nothing.
    pub async fn toggle_mark(&mut self, jobs: Vec<JobPosting>, id: &str) -> Vec<JobPosting> {
        let (jobs, flipped) = reconcile::toggle_mark(jobs, id);

        match flipped {
            Some(marked) => {
                self.session.record(id, marked);
                tracing::info!(id, marked, "Toggled posting");
                self.persist(&jobs).await;
            }
            None => {
                let e = TrackerError::UnknownId { id: id.to_string() };
                tracing::warn!(error = %e, "Ignoring toggle for a stale id");
            }
        }

        jobs
    }

    /// The persisted set as it is now, without touching the feed.
    pub async fn snapshot(&self) -> Vec<JobPosting> {
        self.load_prior().await.unwrap_or_default()
    }

    pub fn board(&self, jobs: &[JobPosting]) -> JobBoard {
        JobBoard::build(jobs, self.policy, &self.session)
    }

    async fn load_prior(&self) -> Option<Vec<JobPosting>> {
        match self.store.load().await {
            Ok(prior) => prior,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    key = self.store.key(),
                    "Snapshot unreadable, treating it as absent"
                );
                None
            }
        }
    }

    async fn fetch_feed(&self) -> Result<Vec<FeedRecord>> {
        match tokio::time::timeout(self.fetch_timeout, self.feed.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(TrackerError::feed_unavailable(format!(
                "fetch timed out after {:?}",
                self.fetch_timeout
            ))),
        }
    }

    async fn persist(&self, jobs: &[JobPosting]) {
        if let Err(e) = self.store.save(jobs).await {
            tracing::error!(
                error = %e,
                suggestion = e.recovery_suggestion(),
                "Failed to persist job set"
            );
        }
    }

    fn report_from(merged: MergeOutcome) -> ReconcileReport {
        ReconcileReport {
            outcome: if merged.first_run {
                ReconcileOutcome::FirstRun
            } else {
                ReconcileOutcome::Merged
            },
            jobs: merged.jobs,
            retained: merged.retained,
            introduced: merged.introduced,
            discarded: merged.discarded,
            blocked: merged.blocked,
            duplicates: merged.duplicates,
            reconciled_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        fail_writes: bool,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.files.lock().await.get(path).cloned())
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            if self.fail_writes {
                return Err(TrackerError::IoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    enum MockFeed {
        Records(Vec<FeedRecord>),
        Down,
        Hang,
    }

    #[async_trait]
    impl FeedSource for MockFeed {
        async fn fetch(&self) -> Result<Vec<FeedRecord>> {
            match self {
                MockFeed::Records(records) => Ok(records.clone()),
                MockFeed::Down => Err(TrackerError::feed_unavailable("connection refused")),
                MockFeed::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(vec![])
                }
            }
        }
    }

    fn record(url: &str) -> FeedRecord {
        FeedRecord {
            title: "Rust Engineer".to_string(),
            company: "Acme".to_string(),
            salary_range: "$150k".to_string(),
            job_type: "Remote".to_string(),
            requirements: vec![],
            apply_url: url.to_string(),
        }
    }

    fn engine(
        storage: MockStorage,
        feed: MockFeed,
        policy: DiscardPolicy,
    ) -> ReconciliationEngine<MockStorage, MockFeed> {
        ReconciliationEngine::new(
            SnapshotStore::new(storage, "jobPostings"),
            feed,
            Blocklist::default(),
            policy,
        )
    }

    async fn seed(storage: &MockStorage, jobs: &[JobPosting]) {
        storage
            .files
            .lock()
            .await
            .insert("jobPostings.json".to_string(), serde_json::to_vec(jobs).unwrap());
    }

    fn posting(id: &str, url: &str, marked: bool) -> JobPosting {
        JobPosting {
            marked,
            ..JobPosting::from_feed(record(url), id.to_string())
        }
    }

    async fn stored(storage: &MockStorage) -> Vec<JobPosting> {
        let bytes = storage.get_file("jobPostings.json").await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_first_run_persists_feed() {
        let storage = MockStorage::default();
        let mut engine = engine(
            storage.clone(),
            MockFeed::Records(vec![record("a"), record("b")]),
            DiscardPolicy::Preserve,
        );

        let report = engine.reconcile().await;

        assert_eq!(report.outcome, ReconcileOutcome::FirstRun);
        assert_eq!(report.introduced, 2);
        assert_eq!(stored(&storage).await, report.jobs);
    }

    #[tokio::test]
    async fn test_fallback_when_feed_down() {
        let storage = MockStorage::default();
        let mut first = engine(
            storage.clone(),
            MockFeed::Records(vec![record("a")]),
            DiscardPolicy::Preserve,
        );
        let initial = first.reconcile().await.jobs;

        let mut second = engine(storage.clone(), MockFeed::Down, DiscardPolicy::Preserve);
        let report = second.reconcile().await;

        assert_eq!(report.outcome, ReconcileOutcome::FeedFallback);
        assert_eq!(report.jobs, initial);
    }

    #[tokio::test]
    async fn test_fallback_drops_duplicate_apply_urls() {
        let storage = MockStorage::default();
        seed(&storage, &[posting("1", "a", false), posting("2", "a", false)]).await;
        let mut engine = engine(storage.clone(), MockFeed::Down, DiscardPolicy::Preserve);

        let report = engine.reconcile().await;

        assert_eq!(report.outcome, ReconcileOutcome::FeedFallback);
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.jobs[0].id, "1");
        assert_eq!(report.duplicates, 1);
        assert_eq!(stored(&storage).await, report.jobs);
    }

    #[tokio::test]
    async fn test_deferred_fallback_drops_marked() {
        let storage = MockStorage::default();
        seed(&storage, &[posting("1", "a", true), posting("2", "b", false)]).await;
        let mut engine = engine(storage.clone(), MockFeed::Down, DiscardPolicy::Deferred);

        let report = engine.reconcile().await;

        let ids: Vec<&str> = report.jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
        assert_eq!(report.discarded, 1);
        let persisted: Vec<String> = stored(&storage).await.into_iter().map(|j| j.id).collect();
        assert_eq!(persisted, vec!["2".to_string()]);
    }

    #[tokio::test]
    async fn test_from_config_applies_settings() {
        let storage = MockStorage::default();
        let config = crate::config::TrackerConfig {
            snapshot_key: "board".to_string(),
            blocklist: vec!["spam".to_string()],
            discard_policy: DiscardPolicy::Deferred,
            ..Default::default()
        };
        let mut engine = ReconciliationEngine::from_config(
            storage.clone(),
            MockFeed::Records(vec![record("https://spam.io/1"), record("https://acme.dev/2")]),
            &config,
        );

        let report = engine.reconcile().await;

        assert_eq!(engine.policy(), DiscardPolicy::Deferred);
        assert_eq!(report.blocked, 1);
        assert!(storage.get_file("board.json").await.is_some());
    }

    #[tokio::test]
    async fn test_fallback_without_snapshot_writes_nothing() {
        let storage = MockStorage::default();
        let mut engine = engine(storage.clone(), MockFeed::Down, DiscardPolicy::Deferred);

        let report = engine.reconcile().await;

        assert!(report.jobs.is_empty());
        assert!(storage.get_file("jobPostings.json").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_timeout_falls_back() {
        let storage = MockStorage::default();
        let mut engine = engine(storage, MockFeed::Hang, DiscardPolicy::Preserve)
            .with_fetch_timeout(Duration::from_millis(50));

        let report = engine.reconcile().await;
        assert_eq!(report.outcome, ReconcileOutcome::FeedFallback);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_treated_as_absent() {
        let storage = MockStorage::default();
        storage
            .files
            .lock()
            .await
            .insert("jobPostings.json".to_string(), b"not json".to_vec());
        let mut engine = engine(
            storage.clone(),
            MockFeed::Records(vec![record("a")]),
            DiscardPolicy::Preserve,
        );

        let report = engine.reconcile().await;

        assert_eq!(report.outcome, ReconcileOutcome::FirstRun);
        assert_eq!(stored(&storage).await.len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_persists_and_tracks_session() {
        let storage = MockStorage::default();
        let mut engine = engine(
            storage.clone(),
            MockFeed::Records(vec![record("a"), record("b")]),
            DiscardPolicy::Deferred,
        );
        let jobs = engine.reconcile().await.jobs;
        let target = jobs[1].id.clone();

        let jobs = engine.toggle_mark(jobs, &target).await;

        assert!(jobs[1].marked);
        assert!(engine.session_marks().contains(&target));
        assert_eq!(stored(&storage).await, jobs);

        let board = engine.board(&jobs);
        assert_eq!(board.active.len(), 1);
        assert_eq!(board.marked_this_session, vec![target.clone()]);

        let jobs = engine.toggle_mark(jobs, &target).await;
        assert!(!jobs[1].marked);
        assert!(engine.session_marks().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_unknown_id_writes_nothing() {
        let storage = MockStorage::default();
        let mut engine = engine(storage.clone(), MockFeed::Down, DiscardPolicy::Preserve);
        let jobs = vec![JobPosting::from_feed(record("a"), "_1".to_string())];

        let result = engine.toggle_mark(jobs.clone(), "nonexistent").await;

        assert_eq!(result, jobs);
        assert!(storage.get_file("jobPostings.json").await.is_none());
    }

    #[tokio::test]
    async fn test_deferred_discard_across_sessions() {
        let storage = MockStorage::default();
        let feed = || MockFeed::Records(vec![record("a"), record("b")]);

        let mut first = engine(storage.clone(), feed(), DiscardPolicy::Deferred);
        let jobs = first.reconcile().await.jobs;
        let old_id = jobs[0].id.clone();
        first.toggle_mark(jobs, &old_id).await;

        let mut second = engine(storage.clone(), feed(), DiscardPolicy::Deferred);
        let report = second.reconcile().await;

        assert_eq!(report.discarded, 1);
        let a = report.jobs.iter().find(|j| j.apply_url == "a").unwrap();
        assert_ne!(a.id, old_id);
        assert!(!a.marked);
        assert!(second.session_marks().is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_still_returns_jobs() {
        let storage = MockStorage {
            fail_writes: true,
            ..MockStorage::default()
        };
        let mut engine = engine(
            storage,
            MockFeed::Records(vec![record("a")]),
            DiscardPolicy::Preserve,
        );

        let report = engine.reconcile().await;
        assert_eq!(report.jobs.len(), 1);
    }
}
