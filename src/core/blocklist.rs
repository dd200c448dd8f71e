use crate::utils::error::{Result, TrackerError};
use url::Url;

/// Host substrings whose postings never enter the tracked set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocklist {
    patterns: Vec<String>,
}

impl Blocklist {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_ascii_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Malformed URLs are never blocked; the failure only reaches the log.
    pub fn is_blocked(&self, apply_url: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        match host_of(apply_url) {
            Ok(host) => self.patterns.iter().any(|p| host.contains(p.as_str())),
            Err(e) => {
                tracing::debug!(error = %e, "Treating posting as not blocklisted");
                false
            }
        }
    }
}

pub fn host_of(apply_url: &str) -> Result<String> {
    let url = Url::parse(apply_url).map_err(|e| TrackerError::InvalidUrl {
        url: apply_url.to_string(),
        message: e.to_string(),
    })?;

    url.host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or_else(|| TrackerError::InvalidUrl {
            url: apply_url.to_string(),
            message: "URL has no host".to_string(),
        })
}
