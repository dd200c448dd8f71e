pub mod blocklist;
pub mod engine;
pub mod reconcile;
pub mod store;

pub use crate::domain::model::{FeedRecord, JobPosting};
pub use crate::domain::ports::{ConfigProvider, FeedSource, Presenter, Storage};
pub use crate::utils::error::Result;
