use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One record of the feed document, before the tracker has assigned it an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub salary_range: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub apply_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedDocument {
    pub jobs: Vec<FeedRecord>,
}

/// A tracked posting as stored in the snapshot.
///
/// `apply_url` is the identity key across feed refreshes, `id` is the identity
/// inside the tracker and is never reused for a different posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub salary_range: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub apply_url: String,
    #[serde(default)]
    pub marked: bool,
}

impl JobPosting {
    /// A posting seen for the first time always starts active.
    pub fn from_feed(record: FeedRecord, id: String) -> Self {
        Self {
            id,
            title: record.title,
            company: record.company,
            salary_range: record.salary_range,
            job_type: record.job_type,
            requirements: record.requirements,
            apply_url: record.apply_url,
            marked: false,
        }
    }

    /// Refresh display fields from the feed, keeping `id` and `marked`.
    pub fn refreshed(self, record: FeedRecord) -> Self {
        Self {
            id: self.id,
            marked: self.marked,
            ..Self::from_feed(record, String::new())
        }
    }

    pub fn state(&self) -> JobState {
        if self.marked {
            JobState::MarkedPendingDeletion
        } else {
            JobState::Active
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Active,
    MarkedPendingDeletion,
}

/// What happens to postings that were marked in an earlier session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DiscardPolicy {
    /// Marked postings are dropped on the next reconciliation.
    Deferred,
    /// Marked postings stay until the user unmarks them.
    #[default]
    #[serde(alias = "preserve-until-unmark")]
    Preserve,
}

impl std::fmt::Display for DiscardPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deferred => write!(f, "deferred"),
            Self::Preserve => write!(f, "preserve"),
        }
    }
}

/// Ids marked during the current session. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMarkSet {
    ids: HashSet<String>,
}

impl SessionMarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror a toggle: `marked == true` records the id, `false` forgets it.
    pub fn record(&mut self, id: &str, marked: bool) {
        if marked {
            self.ids.insert(id.to_string());
        } else {
            self.ids.remove(id);
        }
    }

    /// Drops ids that are no longer marked in `jobs`.
    pub fn retain_marked(&mut self, jobs: &[JobPosting]) {
        let still_marked: HashSet<&str> = jobs
            .iter()
            .filter(|job| job.marked)
            .map(|job| job.id.as_str())
            .collect();
        self.ids.retain(|id| still_marked.contains(id.as_str()));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Read-only view handed to presenters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobBoard {
    pub policy: DiscardPolicy,
    pub active: Vec<JobPosting>,
    pub pending_deletion: Vec<JobPosting>,
    /// Subset of `pending_deletion` ids marked during this session.
    pub marked_this_session: Vec<String>,
}

impl JobBoard {
    pub fn build(jobs: &[JobPosting], policy: DiscardPolicy, session: &SessionMarkSet) -> Self {
        let (pending_deletion, active): (Vec<JobPosting>, Vec<JobPosting>) = jobs
            .iter()
            .cloned()
            .partition(|job| job.state() == JobState::MarkedPendingDeletion);
        let marked_this_session = pending_deletion
            .iter()
            .filter(|job| session.contains(&job.id))
            .map(|job| job.id.clone())
            .collect();

        Self {
            policy,
            active,
            pending_deletion,
            marked_this_session,
        }
    }

    /// Heading for the marked group, worded after the policy that governs it.
    pub fn pending_heading(&self) -> &'static str {
        match self.policy {
            DiscardPolicy::Deferred => "Marked for Deletion (removed on next sync)",
            DiscardPolicy::Preserve => "Marked for Deletion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    FirstRun,
    Merged,
    FeedFallback,
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub jobs: Vec<JobPosting>,
    pub outcome: ReconcileOutcome,
    /// Known postings carried over with their id and marked state.
    pub retained: usize,
    /// Postings seen for the first time, with fresh ids.
    pub introduced: usize,
    /// Marked postings dropped by the deferred policy.
    pub discarded: usize,
    /// Feed records excluded by the blocklist.
    pub blocked: usize,
    /// Feed records skipped because their applyUrl already appeared.
    pub duplicates: usize,
    pub reconciled_at: DateTime<Utc>,
}
