//! Merge of the persisted job set with a fresh feed.
//!
//! Everything here is pure: no storage, no network, no clock. The engine wraps
//! these functions with persistence and logging.

use crate::core::blocklist::Blocklist;
use crate::domain::model::{DiscardPolicy, FeedRecord, JobPosting};
use rand::Rng;
use std::collections::{HashMap, HashSet};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LENGTH: usize = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub jobs: Vec<JobPosting>,
    pub first_run: bool,
    pub retained: usize,
    pub introduced: usize,
    pub discarded: usize,
    pub blocked: usize,
    pub duplicates: usize,
}

/// `_` followed by 7 base-36 characters, redrawn until it is not in `existing`.
pub fn generate_id(existing: &HashSet<String>) -> String {
    let mut rng = rand::rng();
    loop {
        let token: String = (0..ID_LENGTH)
            .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
            .collect();
        let id = format!("_{}", token);
        if !existing.contains(&id) {
            return id;
        }
    }
}

/// Splits off the postings the policy no longer tracks. Returns the survivors
/// in their original order and the number dropped.
pub fn apply_discard_policy(
    prior: Vec<JobPosting>,
    policy: DiscardPolicy,
) -> (Vec<JobPosting>, usize) {
    match policy {
        DiscardPolicy::Preserve => (prior, 0),
        DiscardPolicy::Deferred => {
            let before = prior.len();
            let survivors: Vec<JobPosting> = prior.into_iter().filter(|job| !job.marked).collect();
            let discarded = before - survivors.len();
            (survivors, discarded)
        }
    }
}

/// Keeps the first posting per `applyUrl`. Returns the survivors in order and
/// the number dropped.
pub fn dedup_by_apply_url(jobs: Vec<JobPosting>) -> (Vec<JobPosting>, usize) {
    let before = jobs.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(before);
    let unique: Vec<JobPosting> = jobs
        .into_iter()
        .filter(|job| seen.insert(job.apply_url.clone()))
        .collect();
    let dropped = before - unique.len();
    (unique, dropped)
}

/// Builds the authoritative set for a session.
///
/// Only postings the feed still offers survive. A feed record whose `applyUrl`
/// matches a surviving prior posting keeps that posting's `id` and `marked`
/// state; everything else gets a fresh id and starts active. Unmarked postings
/// come first, feed order is kept within each group.
pub fn merge(
    prior: Option<Vec<JobPosting>>,
    feed: Vec<FeedRecord>,
    blocklist: &Blocklist,
    policy: DiscardPolicy,
) -> MergeOutcome {
    let first_run = prior.is_none();
    let prior = prior.unwrap_or_default();

    // 已丟棄的 id 也不可重用
    let mut ids_in_play: HashSet<String> = prior.iter().map(|job| job.id.clone()).collect();

    let (survivors, discarded) = apply_discard_policy(prior, policy);
    let (survivors, prior_duplicates) = dedup_by_apply_url(survivors);

    let mut known: HashMap<String, JobPosting> = survivors
        .into_iter()
        .map(|job| (job.apply_url.clone(), job))
        .collect();

    let mut outcome = MergeOutcome {
        first_run,
        discarded,
        duplicates: prior_duplicates,
        ..MergeOutcome::default()
    };
    let mut seen_urls: HashSet<String> = HashSet::with_capacity(feed.len());
    let mut active = Vec::new();
    let mut marked = Vec::new();

    for record in feed {
        if blocklist.is_blocked(&record.apply_url) {
            tracing::debug!(apply_url = %record.apply_url, "Skipping blocklisted posting");
            outcome.blocked += 1;
            continue;
        }

        if !seen_urls.insert(record.apply_url.clone()) {
            tracing::debug!(apply_url = %record.apply_url, "Skipping duplicate feed record");
            outcome.duplicates += 1;
            continue;
        }

        let job = match known.remove(&record.apply_url) {
            Some(existing) => {
                outcome.retained += 1;
                existing.refreshed(record)
            }
            None => {
                let id = generate_id(&ids_in_play);
                ids_in_play.insert(id.clone());
                outcome.introduced += 1;
                JobPosting::from_feed(record, id)
            }
        };

        if job.marked {
            marked.push(job);
        } else {
            active.push(job);
        }
    }

    active.extend(marked);
    outcome.jobs = active;
    outcome
}

/// Flips `marked` on the posting with `id`. Other postings are moved through
/// untouched. The second value is the new flag, or `None` when `id` is unknown.
pub fn toggle_mark(mut jobs: Vec<JobPosting>, id: &str) -> (Vec<JobPosting>, Option<bool>) {
    let flipped = jobs.iter_mut().find(|job| job.id == id).map(|job| {
        job.marked = !job.marked;
        job.marked
    });
    (jobs, flipped)
}
