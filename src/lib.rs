pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, TrackerConfig};

pub use adapters::FeedLocation;
pub use crate::core::{blocklist::Blocklist, engine::ReconciliationEngine, store::SnapshotStore};
pub use domain::model::{DiscardPolicy, JobBoard, JobPosting, ReconcileReport};
pub use utils::error::{Result, TrackerError};
