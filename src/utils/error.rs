use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Feed unavailable: {message}")]
    FeedUnavailable { message: String },

    #[error("Corrupt snapshot '{key}': {message}")]
    CorruptSnapshot { key: String, message: String },

    #[error("Invalid apply URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Unknown job id: {id}")]
    UnknownId { id: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Feed,
    Storage,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TrackerError {
    pub fn feed_unavailable(message: impl Into<String>) -> Self {
        Self::FeedUnavailable {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FeedUnavailable { .. } | Self::HttpError(_) => ErrorCategory::Feed,
            Self::CorruptSnapshot { .. } | Self::IoError(_) => ErrorCategory::Storage,
            Self::InvalidUrl { .. } | Self::UnknownId { .. } | Self::SerializationError(_) => {
                ErrorCategory::Data
            }
            Self::TomlError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 引擎內部可以降級處理的錯誤
            Self::InvalidUrl { .. } | Self::UnknownId { .. } => ErrorSeverity::Low,
            Self::FeedUnavailable { .. } | Self::HttpError(_) | Self::CorruptSnapshot { .. } => {
                ErrorSeverity::Medium
            }
            Self::SerializationError(_) | Self::IoError(_) => ErrorSeverity::High,
            _ => ErrorSeverity::Critical,
        }
    }

    /// 引擎是否能以先前狀態繼續執行
    pub fn is_recoverable(&self) -> bool {
        self.severity() <= ErrorSeverity::Medium
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::FeedUnavailable { .. } | Self::HttpError(_) => {
                "Check that the feed location is reachable and returns a JSON object with a `jobs` array"
            }
            Self::CorruptSnapshot { .. } => {
                "The stored snapshot will be rebuilt from the feed on the next sync"
            }
            Self::InvalidUrl { .. } => "Fix the applyUrl of the posting in the feed",
            Self::UnknownId { .. } => "Run `job-tracker list` to see the current job ids",
            Self::IoError(_) => "Check permissions and free space of the store directory",
            Self::SerializationError(_) => "Inspect the snapshot or feed file for invalid JSON",
            _ => "Review the command line flags and the TOML configuration file",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Feed => format!("Could not load the job feed: {}", self),
            ErrorCategory::Storage => format!("Could not access saved jobs: {}", self),
            ErrorCategory::Data => format!("Job data problem: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
