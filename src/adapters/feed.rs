use crate::core::FeedSource;
use crate::domain::model::{FeedDocument, FeedRecord};
use crate::utils::error::{Result, TrackerError};
use crate::utils::validation::looks_like_url;
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

/// Parses a feed document (`{"jobs": [...]}`) into its records.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedRecord>> {
    serde_json::from_slice::<FeedDocument>(bytes)
        .map(|document| document.jobs)
        .map_err(|e| TrackerError::feed_unavailable(format!("invalid feed document: {}", e)))
}

pub struct HttpFeedSource {
    endpoint: String,
    client: Client,
}

impl HttpFeedSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<Vec<FeedRecord>> {
        tracing::debug!("Requesting job feed from: {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await.map_err(|e| {
            TrackerError::feed_unavailable(format!("request to {} failed: {}", self.endpoint, e))
        })?;

        tracing::debug!("Feed response status: {}", response.status());

        if !response.status().is_success() {
            return Err(TrackerError::feed_unavailable(format!(
                "{} returned status {}",
                self.endpoint,
                response.status()
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            TrackerError::feed_unavailable(format!("reading body of {} failed: {}", self.endpoint, e))
        })?;

        parse_feed(&body)
    }
}

/// A `jobs.json` on local disk.
pub struct FileFeedSource {
    path: PathBuf,
}

impl FileFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeedSource for FileFeedSource {
    async fn fetch(&self) -> Result<Vec<FeedRecord>> {
        tracing::debug!("Reading job feed from: {}", self.path.display());
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            TrackerError::feed_unavailable(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        parse_feed(&bytes)
    }
}

/// Feed chosen from a location string: http(s) URLs go over the network,
/// anything else is a file path.
pub enum FeedLocation {
    Http(HttpFeedSource),
    File(FileFeedSource),
}

impl FeedLocation {
    pub fn from_location(location: &str, timeout: Duration) -> Result<Self> {
        if looks_like_url(location) {
            Ok(Self::Http(HttpFeedSource::new(location, timeout)?))
        } else {
            Ok(Self::File(FileFeedSource::new(location)))
        }
    }
}

#[async_trait]
impl FeedSource for FeedLocation {
    async fn fetch(&self) -> Result<Vec<FeedRecord>> {
        match self {
            Self::Http(source) => source.fetch().await,
            Self::File(source) => source.fetch().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn feed_json() -> serde_json::Value {
        serde_json::json!({
            "jobs": [
                {
                    "title": "Platform Engineer",
                    "company": "Acme",
                    "salaryRange": "$140k - $170k",
                    "jobType": "Full-time",
                    "requirements": ["Rust", "Kubernetes"],
                    "applyUrl": "https://acme.dev/jobs/1"
                },
                {
                    "title": "Data Engineer",
                    "company": "Globex",
                    "salaryRange": "$120k",
                    "jobType": "Contract",
                    "requirements": [],
                    "applyUrl": "https://globex.io/apply/7"
                }
            ]
        })
    }

    #[tokio::test]
    async fn test_http_fetch_success() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/jobs.json");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(feed_json());
        });

        let source = HttpFeedSource::new(server.url("/jobs.json"), Duration::from_secs(5)).unwrap();
        let records = source.fetch().await.unwrap();

        api_mock.assert();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].salary_range, "$140k - $170k");
        assert_eq!(records[0].requirements, vec!["Rust", "Kubernetes"]);
        assert_eq!(records[1].apply_url, "https://globex.io/apply/7");
    }

    #[tokio::test]
    async fn test_http_error_status_is_unavailable() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/jobs.json");
            then.status(500);
        });

        let source = HttpFeedSource::new(server.url("/jobs.json"), Duration::from_secs(5)).unwrap();
        let err = source.fetch().await.unwrap_err();

        api_mock.assert();
        assert!(matches!(err, TrackerError::FeedUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_http_wrong_shape_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/jobs.json");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([{"applyUrl": "https://a.dev"}]));
        });

        let source = HttpFeedSource::new(server.url("/jobs.json"), Duration::from_secs(5)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, TrackerError::FeedUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_file_feed() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(feed_json().to_string().as_bytes())
            .unwrap();

        let source = FileFeedSource::new(temp_file.path());
        let records = source.fetch().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let source = FileFeedSource::new("/definitely/not/here/jobs.json");
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, TrackerError::FeedUnavailable { .. }));
    }

    #[test]
    fn test_location_dispatch() {
        let timeout = Duration::from_secs(1);
        assert!(matches!(
            FeedLocation::from_location("https://acme.dev/jobs.json", timeout).unwrap(),
            FeedLocation::Http(_)
        ));
        assert!(matches!(
            FeedLocation::from_location("jobs.json", timeout).unwrap(),
            FeedLocation::File(_)
        ));
    }
}
