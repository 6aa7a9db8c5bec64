//! HTTP client for the record store.
//!
//! The store is a set of scripts answering form-encoded POSTs with JSON
//! arrays. Three endpoints are consumed:
//!
//! | Endpoint (default path) | Form fields | Response |
//! |-------------------------|-------------|----------|
//! | `get_day_records.php` | *(none)* | `[{id, time}]` range-start markers |
//! | `get_today_records.php` | `date`, `count` | records of `date`, ascending |
//! | `get_update.php` | `last_id` | records with `id > last_id`, ascending |
//!
//! # Example
//!
//! ```no_run
//! use co2dash_core::client::StoreClient;
//! use co2dash_core::RecordStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = StoreClient::new("http://localhost/co2")?;
//!
//! let markers = client.fetch_day_boundaries().await?;
//! println!("{} data ranges", markers.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use co2dash_types::{DayBoundary, DayKey, Record};

use crate::error::Error;
use crate::store::RecordStore;

/// HTTP client for the record store.
#[derive(Debug, Clone)]
pub struct StoreClient {
    client: Client,
    base_url: String,
    endpoints: Endpoints,
}

/// Error type for store client operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreClientError {
    /// The store is not reachable.
    #[error("Store not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The store answered with a non-success status.
    #[error("Store error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The body was not the expected JSON.
    #[error("Unexpected response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl StoreClientError {
    /// Convert into the core error taxonomy, tagging the failed operation.
    pub fn into_core(self, operation: &'static str) -> Error {
        match self {
            Self::Malformed(e) => Error::MalformedResponse {
                operation,
                message: e.to_string(),
            },
            other => Error::transport(operation, other.to_string()),
        }
    }
}

/// Result type for store client operations.
pub type Result<T> = std::result::Result<T, StoreClientError>;

/// Paths of the store scripts, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Range-start markers used to build the day catalog.
    pub day_boundaries: String,
    /// Records for a single day.
    pub day_records: String,
    /// Records newer than a given id.
    pub incremental: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            day_boundaries: "get_day_records.php".to_string(),
            day_records: "get_today_records.php".to_string(),
            incremental: "get_update.php".to_string(),
        }
    }
}

#[derive(Serialize)]
struct DayRecordsForm {
    date: String,
    count: u32,
}

#[derive(Serialize)]
struct IncrementalForm {
    last_id: i64,
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    let base_url = base_url.trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(StoreClientError::InvalidUrl(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    Ok(base_url)
}

impl StoreClient {
    /// Create a new store client.
    ///
    /// No request timeout is set; requests rely on transport defaults.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Directory URL hosting the store scripts (e.g., "http://localhost/co2")
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder().build().map_err(StoreClientError::Request)?;

        Ok(Self {
            client,
            base_url,
            endpoints: Endpoints::default(),
        })
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StoreClientError::Request)?;
        Self::with_client(base_url, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;

        Ok(Self {
            client,
            base_url,
            endpoints: Endpoints::default(),
        })
    }

    /// Replace the endpoint paths.
    #[must_use]
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Fetch range-start markers.
    pub async fn day_boundaries(&self) -> Result<Vec<DayBoundary>> {
        let url = self.url(&self.endpoints.day_boundaries);
        self.send(&url, self.client.post(&url)).await
    }

    /// Fetch the records of `day` (`count = 0` for all of them).
    pub async fn day_records(&self, day: DayKey, count: u32) -> Result<Vec<Record>> {
        let url = self.url(&self.endpoints.day_records);
        let form = DayRecordsForm {
            date: day.to_string(),
            count,
        };
        self.send(&url, self.client.post(&url).form(&form)).await
    }

    /// Fetch records with `id > last_id`.
    pub async fn incremental(&self, last_id: i64) -> Result<Vec<Record>> {
        let url = self.url(&self.endpoints.incremental);
        let form = IncrementalForm { last_id };
        self.send(&url, self.client.post(&url).form(&form)).await
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    async fn send<T: DeserializeOwned>(&self, url: &str, request: RequestBuilder) -> Result<T> {
        debug!("POST {}", url);
        let response = request.send().await.map_err(|e| {
            StoreClientError::NotReachable {
                url: url.to_string(),
                source: e,
            }
        })?;

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await.map_err(StoreClientError::Request)?;

        if status.is_success() {
            Ok(serde_json::from_str(&body)?)
        } else {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or_else(|| status.to_string());

            Err(StoreClientError::ApiError {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl RecordStore for StoreClient {
    async fn fetch_day_boundaries(&self) -> crate::Result<Vec<DayBoundary>> {
        self.day_boundaries()
            .await
            .map_err(|e| e.into_core("fetch_day_boundaries"))
    }

    async fn fetch_day_records(&self, day: DayKey, count: u32) -> crate::Result<Vec<Record>> {
        self.day_records(day, count)
            .await
            .map_err(|e| e.into_core("fetch_day_records"))
    }

    async fn fetch_incremental(&self, last_id: i64) -> crate::Result<Vec<Record>> {
        self.incremental(last_id)
            .await
            .map_err(|e| e.into_core("fetch_incremental"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = StoreClient::new("http://localhost/co2");
        assert!(client.is_ok());

        let client = client.unwrap();
        assert_eq!(client.base_url(), "http://localhost/co2");
    }

    #[test]
    fn test_client_normalizes_url() {
        let client = StoreClient::new("http://localhost/co2/").unwrap();
        assert_eq!(client.base_url(), "http://localhost/co2");
        assert_eq!(
            client.url("get_update.php"),
            "http://localhost/co2/get_update.php"
        );
        assert_eq!(
            client.url("/get_update.php"),
            "http://localhost/co2/get_update.php"
        );
    }

    #[test]
    fn test_client_invalid_url() {
        let result = StoreClient::new("localhost/co2");
        assert!(matches!(result, Err(StoreClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_endpoints_partial_override() {
        let json = r#"{"incremental": "update.php"}"#;
        let endpoints: Endpoints = serde_json::from_str(json).unwrap();
        assert_eq!(endpoints.incremental, "update.php");
        assert_eq!(endpoints.day_records, "get_today_records.php");
    }

    #[test]
    fn test_malformed_maps_to_core_malformed() {
        let json_err = serde_json::from_str::<Vec<Record>>("{").unwrap_err();
        let err = StoreClientError::Malformed(json_err).into_core("fetch_incremental");
        assert!(matches!(
            err,
            Error::MalformedResponse {
                operation: "fetch_incremental",
                ..
            }
        ));
    }

    #[test]
    fn test_api_error_maps_to_transport() {
        let err = StoreClientError::ApiError {
            status: 500,
            message: "db down".to_string(),
        }
        .into_core("fetch_day_records");
        assert!(matches!(err, Error::Transport { .. }));
        assert!(err.to_string().contains("db down"));
    }
}
