use anyhow::{Context, Result};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

use super::types::{DataSource, FetchError, Rows};
use crate::credentials::SheetsAuth;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Body of a `spreadsheets.values.get` response. `values` is absent for an
/// empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Rows,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Read-only client for the Google Sheets v4 values API
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    auth: SheetsAuth,
    base_url: String,
}

impl SheetsClient {
    pub fn new(auth: SheetsAuth) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("cmwmc-calc/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            auth,
            base_url: SHEETS_API_BASE.to_string(),
        })
    }

    /// Point the client at a different API root (used by tests and proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the values URL. Range text is percent-encoded as a path segment.
    pub fn values_url(&self, sheet_id: &str, range: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::Decode(format!("invalid API base URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| FetchError::Decode("API base URL cannot have a path".to_string()))?
            .push(sheet_id)
            .push("values")
            .push(range);

        if let SheetsAuth::ApiKey(key) = &self.auth {
            url.query_pairs_mut().append_pair("key", key);
        }

        Ok(url)
    }

    async fn fetch_once(&self, sheet_id: &str, range: &str) -> Result<Rows, FetchError> {
        let url = self.values_url(sheet_id, range)?;

        let mut request = self.http.get(url);
        if let SheetsAuth::Bearer(token) = &self.auth {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, range, &body));
        }

        let value_range: ValueRange = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        tracing::debug!("{} rows retrieved from {}", value_range.values.len(), range);
        Ok(value_range.values)
    }
}

impl DataSource for SheetsClient {
    async fn fetch_column(&self, sheet_id: &str, range: &str) -> Result<Rows, FetchError> {
        // Retry strategy: exponential backoff with 3 attempts, transient errors only
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(3);

        RetryIf::spawn(
            retry_strategy,
            || self.fetch_once(sheet_id, range),
            |e: &FetchError| {
                let retry = e.is_transient();
                if retry {
                    tracing::warn!("Retrying {} after error: {}", range, e);
                }
                retry
            },
        )
        .await
    }
}

/// Turn a non-success response into a tagged error
fn map_status(status: StatusCode, range: &str, body: &str) -> FetchError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Unauthorized(message),
        StatusCode::NOT_FOUND => FetchError::NotFound(range.to_string()),
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited,
        StatusCode::BAD_REQUEST if message.contains("Unable to parse range") => {
            FetchError::NotFound(range.to_string())
        }
        _ => FetchError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_client() -> SheetsClient {
        let _ = rustls::crypto::ring::default_provider().install_default();
        SheetsClient::new(SheetsAuth::ApiKey("test-key".to_string())).unwrap()
    }

    #[test]
    fn test_values_url_encodes_range() {
        let url = key_client()
            .values_url("sheet123", "Team Overall!C2:C22")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet123/values/Team%20Overall!C2:C22?key=test-key"
        );
    }

    #[test]
    fn test_values_url_bearer_has_no_key() {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let client = SheetsClient::new(SheetsAuth::Bearer("tok".to_string())).unwrap();
        let url = client.values_url("abc", "Individual!Z1:Z57").unwrap();
        assert!(url.query().is_none());
    }

    #[test]
    fn test_values_url_custom_base() {
        let client = key_client().with_base_url("http://localhost:8080/v4/spreadsheets");
        let url = client.values_url("abc", "Relay!D2:D22").unwrap();
        assert!(url.as_str().starts_with("http://localhost:8080/v4/spreadsheets/abc/values/"));
    }

    #[test]
    fn test_value_range_missing_values_is_empty() {
        let parsed: ValueRange =
            serde_json::from_str(r#"{"range":"Individual!Z1:Z57","majorDimension":"ROWS"}"#).unwrap();
        assert!(parsed.values.is_empty());
    }

    #[test]
    fn test_value_range_rows() {
        let parsed: ValueRange =
            serde_json::from_str(r#"{"values":[["12"],[],["3","4"]]}"#).unwrap();
        assert_eq!(parsed.values.len(), 3);
        assert_eq!(parsed.values[0], vec!["12".to_string()]);
    }

    #[test]
    fn test_map_status_forbidden() {
        let body = r#"{"error":{"code":403,"message":"The caller does not have permission","status":"PERMISSION_DENIED"}}"#;
        let err = map_status(StatusCode::FORBIDDEN, "A1", body);
        assert_eq!(
            err,
            FetchError::Unauthorized("The caller does not have permission".to_string())
        );
    }

    #[test]
    fn test_map_status_bad_range() {
        let body = r#"{"error":{"code":400,"message":"Unable to parse range: Nope!A1"}}"#;
        let err = map_status(StatusCode::BAD_REQUEST, "Nope!A1", body);
        assert_eq!(err, FetchError::NotFound("Nope!A1".to_string()));
    }

    #[test]
    fn test_map_status_rate_limit_and_other() {
        assert_eq!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "A1", ""),
            FetchError::RateLimited
        );
        assert_eq!(
            map_status(StatusCode::BAD_GATEWAY, "A1", "upstream down"),
            FetchError::Http {
                status: 502,
                message: "upstream down".to_string()
            }
        );
    }
}
