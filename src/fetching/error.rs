use crate::processing::windows::DateWindow;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read response body from {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode air-quality JSON")]
    Json(#[from] serde_json::Error),

    #[error("Upstream API rejected the request: {0}")]
    Upstream(String),

    #[error("Malformed air-quality payload: {0}")]
    MalformedPayload(String),

    #[error("Fetching window {window} failed")]
    Window {
        window: DateWindow,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::NetworkRequest(..) | FetchError::Body { .. } => true,
            FetchError::HttpStatus { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::Window { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request_error() -> reqwest::Error {
        reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err()
    }

    #[test]
    fn test_is_transient() {
        let network = FetchError::NetworkRequest("air-quality".into(), request_error());
        assert!(network.is_transient());

        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let window = DateWindow { start: day, end: day };
        let wrapped = FetchError::Window {
            window,
            source: Box::new(network),
        };
        assert!(wrapped.is_transient());

        assert!(!FetchError::Upstream("bad parameter".into()).is_transient());
        assert!(!FetchError::MalformedPayload("short".into()).is_transient());
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!FetchError::Json(json).is_transient());
        let permanent = FetchError::Window {
            window,
            source: Box::new(FetchError::Upstream("no data".into())),
        };
        assert!(!permanent.is_transient());
    }
}
