pub mod cli;
pub mod toml_config;

use crate::core::store::DEFAULT_SNAPSHOT_KEY;
use crate::core::ConfigProvider;
use crate::domain::model::DiscardPolicy;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_FEED_LOCATION: &str = "jobs.json";
pub const DEFAULT_STORE_PATH: &str = "./.job-tracker";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Fully resolved settings: defaults, then the TOML file, then CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub feed_location: String,
    pub store_path: String,
    pub snapshot_key: String,
    pub blocklist: Vec<String>,
    pub discard_policy: DiscardPolicy,
    pub fetch_timeout_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            feed_location: DEFAULT_FEED_LOCATION.to_string(),
            store_path: DEFAULT_STORE_PATH.to_string(),
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            blocklist: Vec::new(),
            discard_policy: DiscardPolicy::default(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl TrackerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl ConfigProvider for TrackerConfig {
    fn feed_location(&self) -> &str {
        &self.feed_location
    }

    fn store_path(&self) -> &str {
        &self.store_path
    }

    fn snapshot_key(&self) -> &str {
        &self.snapshot_key
    }

    fn blocklist(&self) -> &[String] {
        &self.blocklist
    }

    fn discard_policy(&self) -> DiscardPolicy {
        self.discard_policy
    }

    fn fetch_timeout_secs(&self) -> u64 {
        self.fetch_timeout_secs
    }
}

impl Validate for TrackerConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_feed_location("feed", &self.feed_location)?;
        validation::validate_path("store_dir", &self.store_path)?;
        validation::validate_snapshot_key("snapshot_key", &self.snapshot_key)?;
        validation::validate_positive_number("fetch_timeout_secs", self.fetch_timeout_secs, 1)?;
        validation::validate_blocklist("blocklist", &self.blocklist)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
pub use args::{CliConfig, Command, LogFormat};

#[cfg(feature = "cli")]
mod args {
    use super::toml_config::TomlConfig;
    use super::TrackerConfig;
    use crate::domain::model::DiscardPolicy;
    use crate::utils::error::Result;
    use clap::{Parser, Subcommand, ValueEnum};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "job-tracker")]
    #[command(about = "Reconcile a job feed with your saved application pipeline")]
    pub struct CliConfig {
        #[command(subcommand)]
        pub command: Option<Command>,

        /// Path to a TOML configuration file
        #[arg(short, long, global = true)]
        pub config: Option<String>,

        /// Feed location: an http(s) URL or a path to jobs.json
        #[arg(long, global = true)]
        pub feed: Option<String>,

        /// Directory holding the persisted snapshot
        #[arg(long, global = true)]
        pub store_dir: Option<String>,

        /// Name of the snapshot slot
        #[arg(long, global = true)]
        pub snapshot_key: Option<String>,

        /// Host substrings to exclude, comma separated
        #[arg(long, value_delimiter = ',', global = true)]
        pub blocklist: Option<Vec<String>>,

        /// What happens to postings marked in an earlier session
        #[arg(long, value_enum, global = true)]
        pub policy: Option<DiscardPolicy>,

        #[arg(long, global = true)]
        pub fetch_timeout_secs: Option<u64>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
        pub log_format: LogFormat,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
    pub enum Command {
        /// Reconcile the saved jobs with the feed and show them (default)
        Sync,
        /// Show the saved jobs without fetching the feed
        List,
        /// Flip the mark on one job
        Toggle { id: String },
        /// Reconcile, then read `toggle <id>`, `list` and `quit` from stdin
        Session,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    pub enum LogFormat {
        Compact,
        Json,
    }

    impl CliConfig {
        pub fn command(&self) -> Command {
            self.command.clone().unwrap_or(Command::Sync)
        }

        /// Defaults, overlaid by `--config`, overlaid by explicit flags.
        pub fn resolve(&self) -> Result<TrackerConfig> {
            let mut config = match &self.config {
                Some(path) => TomlConfig::from_file(path)?.into_tracker_config(),
                None => TrackerConfig::default(),
            };

            if let Some(feed) = &self.feed {
                config.feed_location = feed.clone();
            }
            if let Some(store_dir) = &self.store_dir {
                config.store_path = store_dir.clone();
            }
            if let Some(key) = &self.snapshot_key {
                config.snapshot_key = key.clone();
            }
            if let Some(blocklist) = &self.blocklist {
                config.blocklist = blocklist.clone();
            }
            if let Some(policy) = self.policy {
                config.discard_policy = policy;
            }
            if let Some(timeout) = self.fetch_timeout_secs {
                config.fetch_timeout_secs = timeout;
            }

            Ok(config)
        }
    }
}
