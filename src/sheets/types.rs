use std::future::Future;
use thiserror::Error;

/// Rows of cell text as returned by a range read.
pub type Rows = Vec<Vec<String>>;

/// Why a range read failed. Never stands in for data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    #[error("access denied to spreadsheet. Check the API key or token and sharing settings ({0})")]
    Unauthorized(String),
    #[error("range '{0}' not found in spreadsheet")]
    NotFound(String),
    #[error("Sheets API rate limit exceeded. Wait a minute and try again.")]
    RateLimited,
    #[error("Sheets API error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("range '{0}' missing from snapshot")]
    MissingRange(String),
}

impl FetchError {
    /// Transient failures worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::RateLimited)
    }
}

/// Anything that can read a column range out of a spreadsheet.
pub trait DataSource {
    fn fetch_column(
        &self,
        sheet_id: &str,
        range: &str,
    ) -> impl Future<Output = Result<Rows, FetchError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(FetchError::Network("reset".to_string()).is_transient());
        assert!(FetchError::RateLimited.is_transient());
        assert!(!FetchError::Unauthorized("403".to_string()).is_transient());
        assert!(!FetchError::NotFound("A1".to_string()).is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = FetchError::Http {
            status: 500,
            message: "backend error".to_string(),
        };
        assert_eq!(err.to_string(), "Sheets API error 500: backend error");
        assert_eq!(
            FetchError::MissingRange("Relay!D2:D22".to_string()).to_string(),
            "range 'Relay!D2:D22' missing from snapshot"
        );
    }
}
