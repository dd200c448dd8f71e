use crate::config::TrackerConfig;
use crate::domain::model::DiscardPolicy;
use crate::utils::error::{Result, TrackerError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `tracker.toml`：所有欄位皆可省略，未設定的沿用預設值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub feed: Option<FeedSection>,
    pub store: Option<StoreSection>,
    pub reconcile: Option<ReconcileSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedSection {
    pub location: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSection {
    pub directory: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileSection {
    pub policy: Option<DiscardPolicy>,
    pub blocklist: Option<Vec<String>>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${JOB_FEED_URL})，未定義的變數原樣保留
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TrackerError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 將檔案中有設定的欄位覆蓋到 `config`
    pub fn apply_to(&self, config: &mut TrackerConfig) {
        if let Some(feed) = &self.feed {
            if let Some(location) = &feed.location {
                config.feed_location = location.clone();
            }
            if let Some(timeout) = feed.timeout_seconds {
                config.fetch_timeout_secs = timeout;
            }
        }

        if let Some(store) = &self.store {
            if let Some(directory) = &store.directory {
                config.store_path = directory.clone();
            }
            if let Some(key) = &store.key {
                config.snapshot_key = key.clone();
            }
        }

        if let Some(reconcile) = &self.reconcile {
            if let Some(policy) = reconcile.policy {
                config.discard_policy = policy;
            }
            if let Some(blocklist) = &reconcile.blocklist {
                config.blocklist = blocklist.clone();
            }
        }
    }

    pub fn into_tracker_config(self) -> TrackerConfig {
        let mut config = TrackerConfig::default();
        self.apply_to(&mut config);
        config
    }
}
