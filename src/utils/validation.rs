use crate::utils::error::{Result, TrackerError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(TrackerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(TrackerError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(TrackerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// Feed 可以是 http(s) URL，也可以是本地的 jobs.json 路徑
pub fn validate_feed_location(field_name: &str, location: &str) -> Result<()> {
    if looks_like_url(location) {
        validate_url(field_name, location)
    } else {
        validate_path(field_name, location)
    }
}

pub fn looks_like_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(TrackerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(TrackerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(TrackerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TrackerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 快照 key 會成為 store 目錄下的檔名，不可跳出該目錄
pub fn validate_snapshot_key(field_name: &str, key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(TrackerError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    if key.contains('/') || key.contains('\\') || key.contains("..") {
        return Err(TrackerError::ConfigValidationError {
            field: field_name.to_string(),
            message: format!("'{}' must be a plain file name", key),
        });
    }

    validate_path(field_name, key)
}

pub fn validate_blocklist(field_name: &str, entries: &[String]) -> Result<()> {
    for entry in entries {
        validate_non_empty_string(field_name, entry)?;
    }
    Ok(())
}
