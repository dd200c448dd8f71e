use crate::core::Storage;
use crate::domain::model::JobPosting;
use crate::utils::error::{Result, TrackerError};

pub const DEFAULT_SNAPSHOT_KEY: &str = "jobPostings";

/// The single named slot holding the serialized job set between sessions.
#[derive(Debug, Clone)]
pub struct SnapshotStore<S: Storage> {
    storage: S,
    key: String,
}

impl<S: Storage> SnapshotStore<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn file_name(&self) -> String {
        format!("{}.json", self.key)
    }

    /// `Ok(None)` when nothing was ever saved, `CorruptSnapshot` when the bytes
    /// are not a JSON array of postings.
    pub async fn load(&self) -> Result<Option<Vec<JobPosting>>> {
        let Some(bytes) = self.storage.read_file(&self.file_name()).await? else {
            return Ok(None);
        };

        let jobs: Vec<JobPosting> =
            serde_json::from_slice(&bytes).map_err(|e| TrackerError::CorruptSnapshot {
                key: self.key.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!("Loaded {} postings from snapshot '{}'", jobs.len(), self.key);
        Ok(Some(jobs))
    }

    pub async fn save(&self, jobs: &[JobPosting]) -> Result<()> {
        let data = serde_json::to_vec_pretty(jobs)?;
        self.storage.write_file(&self.file_name(), &data).await?;
        tracing::debug!("Saved {} postings to snapshot '{}'", jobs.len(), self.key);
        Ok(())
    }
}
