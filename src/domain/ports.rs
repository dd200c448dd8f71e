use crate::domain::model::{DiscardPolicy, FeedRecord, JobBoard};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Key-value byte storage. `read_file` yields `None` when nothing was ever written.
pub trait Storage: Send + Sync {
    fn read_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    /// Replaces the whole value; a concurrent reader sees the old or the new bytes, never a mix.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn feed_location(&self) -> &str;
    fn store_path(&self) -> &str;
    fn snapshot_key(&self) -> &str;
    fn blocklist(&self) -> &[String];
    fn discard_policy(&self) -> DiscardPolicy;
    fn fetch_timeout_secs(&self) -> u64;
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fails with `FeedUnavailable` on any transport or parse problem.
    async fn fetch(&self) -> Result<Vec<FeedRecord>>;
}

pub trait Presenter {
    fn render(&mut self, board: &JobBoard) -> Result<()>;
}
