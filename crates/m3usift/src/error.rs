use reqwest::StatusCode;

/// Fatal errors: playlist fetch/read and client construction.
///
/// Per-link probe failures never surface here; they are folded into the
/// [`Verdict`](crate::classify::Verdict) for the affected entry.
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("playlist fetch failed with HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("configuration error: {reason}")]
    Configuration { reason: String },
}

impl SiftError {
    pub fn http_status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}
