//! Single-link probing and classification.
//!
//! One HEAD request per link, redirects followed, outcome mapped to a
//! [`Verdict`] from the final status code and `Content-Type` header. The
//! classifier never fails toward its caller: every probe outcome, including
//! network-layer errors, becomes a verdict.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use tracing::debug;

use crate::config::{CheckerConfig, MAX_REDIRECTS};
use crate::error::SiftError;
use crate::playlist::Entry;

/// Content types treated as definitive streaming media (normalized form).
const VALID_CONTENT_TYPES: &[&str] = &[
    "application/vnd.apple.mpegurl",
    "application/x-mpegurl",
    "audio/mpegurl",
    "video/mp2t",
    "video/mpeg",
    "video/x-msvideo",
    "video/mp4",
    "audio/mpeg",
    "audio/aac",
    "audio/ogg",
    "application/octet-stream",
    "video/x-flv",
];

/// Content-type prefixes treated as definitively non-streaming.
const IGNORED_CONTENT_TYPE_PREFIXES: &[&str] = &[
    "text/html",
    "application/json",
    "text/plain",
    "image/",
    "application/pdf",
    "application/xml",
    "text/xml",
];

/// Classification outcome for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    /// 200 with a recognized streaming content type.
    Valid,
    /// 200 with a content type in neither the recognized nor the ignored set.
    PossiblyValid,
    /// Everything else, including probe failures.
    Invalid,
    /// Non-HTTP(S) URL, never probed.
    Skipped,
}

impl LinkStatus {
    /// Whether this entry survives into the output playlist.
    pub fn is_playable(self) -> bool {
        matches!(self, LinkStatus::Valid | LinkStatus::PossiblyValid)
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkStatus::Valid => write!(f, "valid"),
            LinkStatus::PossiblyValid => write!(f, "possibly valid"),
            LinkStatus::Invalid => write!(f, "invalid"),
            LinkStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Outcome of probing one [`Entry`].
#[derive(Debug, Clone)]
pub struct Verdict {
    pub entry: Arc<Entry>,
    pub status: LinkStatus,
    pub reason: String,
}

impl Verdict {
    pub fn new(entry: Arc<Entry>, status: LinkStatus, reason: impl Into<String>) -> Self {
        Self {
            entry,
            status,
            reason: reason.into(),
        }
    }

    pub fn skipped(entry: Arc<Entry>) -> Self {
        Self::new(entry, LinkStatus::Skipped, "non-HTTP(S) URL, not probed")
    }
}

/// Closed set of network-layer failure kinds a probe can hit.
#[derive(Debug, thiserror::Error)]
pub enum ProbeFailure {
    #[error("connection timed out")]
    Timeout,

    #[error("connection failed: {reason}")]
    Connect { reason: String },

    #[error("too many redirects (limit {MAX_REDIRECTS})")]
    TooManyRedirects,

    #[error("request failed: {reason}")]
    Request { reason: String },

    #[error("unexpected probe error: {reason}")]
    Unexpected { reason: String },
}

impl From<reqwest::Error> for ProbeFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeFailure::Timeout
        } else if err.is_redirect() {
            ProbeFailure::TooManyRedirects
        } else if err.is_connect() {
            ProbeFailure::Connect {
                reason: err.to_string(),
            }
        } else if err.is_request() || err.is_builder() {
            ProbeFailure::Request {
                reason: err.to_string(),
            }
        } else {
            ProbeFailure::Unexpected {
                reason: err.to_string(),
            }
        }
    }
}

/// Lowercase a content-type header and strip any `;` parameter suffix.
fn normalize_content_type(raw: &str) -> String {
    raw.split(';').next().unwrap_or("").trim().to_lowercase()
}

fn is_ignored_content_type(normalized: &str) -> bool {
    if normalized.is_empty() {
        return false;
    }
    IGNORED_CONTENT_TYPE_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
}

/// Performs one HEAD probe per call and maps the outcome to a [`Verdict`].
pub struct LinkClassifier {
    client: reqwest::Client,
    probe_timeout: Duration,
}

impl LinkClassifier {
    pub fn new(config: &CheckerConfig) -> Result<Self, SiftError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self {
            client,
            probe_timeout: config.probe_timeout,
        })
    }

    /// Probe one entry. Infallible toward the caller: network failures are
    /// folded into an `Invalid` verdict carrying the failure kind.
    pub async fn classify(&self, entry: Arc<Entry>) -> Verdict {
        if let Err(e) = url::Url::parse(&entry.url) {
            return Verdict::new(
                entry,
                LinkStatus::Invalid,
                format!("invalid URL: {e}"),
            );
        }

        debug!(url = %entry.url, "probing link");
        let response = self
            .client
            .head(&entry.url)
            .timeout(self.probe_timeout)
            .send()
            .await;

        let response = match response {
            Ok(resp) => resp,
            Err(e) => {
                let failure = ProbeFailure::from(e);
                return Verdict::new(entry, LinkStatus::Invalid, failure.to_string());
            }
        };

        let status = response.status();
        let content_type_header = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_owned();
        let content_type = normalize_content_type(&content_type_header);

        if status.as_u16() == 200 {
            if VALID_CONTENT_TYPES.contains(&content_type.as_str()) {
                Verdict::new(
                    entry,
                    LinkStatus::Valid,
                    format!("status 200, type {content_type_header}"),
                )
            } else if is_ignored_content_type(&content_type) {
                Verdict::new(
                    entry,
                    LinkStatus::Invalid,
                    format!("status 200, type {content_type_header} (not typically streaming)"),
                )
            } else {
                Verdict::new(
                    entry,
                    LinkStatus::PossiblyValid,
                    format!("status 200, type {content_type_header} (unknown type)"),
                )
            }
        } else if status.is_redirection() {
            // Redirect following is enabled, so a final 3xx means the chain
            // stopped unresolved (e.g. a scheme the client will not follow).
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("N/A");
            Verdict::new(
                entry,
                LinkStatus::Invalid,
                format!("unresolved redirect {status}, location: {location}"),
            )
        } else if status.is_client_error() || status.is_server_error() {
            Verdict::new(entry, LinkStatus::Invalid, format!("HTTP error {status}"))
        } else {
            Verdict::new(
                entry,
                LinkStatus::Invalid,
                format!("unknown status {status}, type {content_type_header}"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(url: &str) -> Arc<Entry> {
        Arc::new(Entry {
            metadata: None,
            url: url.to_owned(),
            original_index: 1,
        })
    }

    fn classifier_with_timeout(timeout: Duration) -> LinkClassifier {
        let config = CheckerConfig {
            probe_timeout: timeout,
            ..CheckerConfig::default()
        };
        LinkClassifier::new(&config).expect("client should build")
    }

    fn classifier() -> LinkClassifier {
        classifier_with_timeout(Duration::from_secs(5))
    }

    async fn mock_head(server: &MockServer, route: &str, template: ResponseTemplate) {
        Mock::given(method("HEAD"))
            .and(path(route))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[test]
    fn content_type_normalization() {
        assert_eq!(normalize_content_type("VIDEO/MP2T"), "video/mp2t");
        assert_eq!(
            normalize_content_type("application/x-mpegURL; charset=UTF-8"),
            "application/x-mpegurl"
        );
        assert_eq!(normalize_content_type("  text/html ; x=y"), "text/html");
        assert_eq!(normalize_content_type(""), "");
    }

    #[test]
    fn ignored_prefixes_cover_wildcards() {
        assert!(is_ignored_content_type("image/png"));
        assert!(is_ignored_content_type("image/svg+xml"));
        assert!(is_ignored_content_type("text/html"));
        assert!(!is_ignored_content_type("video/mp2t"));
        assert!(!is_ignored_content_type(""));
    }

    #[tokio::test]
    async fn status_200_with_stream_type_is_valid() {
        let server = MockServer::start().await;
        mock_head(
            &server,
            "/stream.ts",
            ResponseTemplate::new(200).insert_header("content-type", "video/mp2t"),
        )
        .await;

        let verdict = classifier()
            .classify(entry(&format!("{}/stream.ts", server.uri())))
            .await;
        assert_eq!(verdict.status, LinkStatus::Valid);
        assert!(verdict.reason.contains("video/mp2t"), "{}", verdict.reason);
    }

    #[tokio::test]
    async fn status_200_with_uppercase_parameterized_type_is_valid() {
        let server = MockServer::start().await;
        mock_head(
            &server,
            "/live.m3u8",
            ResponseTemplate::new(200)
                .insert_header("content-type", "Application/X-MpegURL; charset=utf-8"),
        )
        .await;

        let verdict = classifier()
            .classify(entry(&format!("{}/live.m3u8", server.uri())))
            .await;
        assert_eq!(verdict.status, LinkStatus::Valid);
    }

    #[tokio::test]
    async fn status_200_with_html_is_invalid() {
        let server = MockServer::start().await;
        mock_head(
            &server,
            "/page",
            ResponseTemplate::new(200).insert_header("content-type", "text/html"),
        )
        .await;

        let verdict = classifier()
            .classify(entry(&format!("{}/page", server.uri())))
            .await;
        assert_eq!(verdict.status, LinkStatus::Invalid);
        assert!(
            verdict.reason.contains("not typically streaming"),
            "{}",
            verdict.reason
        );
    }

    #[tokio::test]
    async fn status_200_with_unknown_type_is_possibly_valid() {
        let server = MockServer::start().await;
        mock_head(
            &server,
            "/odd",
            ResponseTemplate::new(200).insert_header("content-type", "application/weird-type"),
        )
        .await;

        let verdict = classifier()
            .classify(entry(&format!("{}/odd", server.uri())))
            .await;
        assert_eq!(verdict.status, LinkStatus::PossiblyValid);
    }

    #[tokio::test]
    async fn status_200_without_content_type_is_possibly_valid() {
        let server = MockServer::start().await;
        mock_head(&server, "/bare", ResponseTemplate::new(200)).await;

        let verdict = classifier()
            .classify(entry(&format!("{}/bare", server.uri())))
            .await;
        assert_eq!(verdict.status, LinkStatus::PossiblyValid);
    }

    #[tokio::test]
    async fn http_error_status_is_invalid() {
        let server = MockServer::start().await;
        mock_head(&server, "/gone", ResponseTemplate::new(404)).await;

        let verdict = classifier()
            .classify(entry(&format!("{}/gone", server.uri())))
            .await;
        assert_eq!(verdict.status, LinkStatus::Invalid);
        assert!(verdict.reason.contains("404"), "{}", verdict.reason);
    }

    #[tokio::test]
    async fn timed_out_probe_is_invalid_with_timeout_reason() {
        let server = MockServer::start().await;
        mock_head(
            &server,
            "/slow",
            ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
        )
        .await;

        let verdict = classifier_with_timeout(Duration::from_millis(100))
            .classify(entry(&format!("{}/slow", server.uri())))
            .await;
        assert_eq!(verdict.status, LinkStatus::Invalid);
        assert!(verdict.reason.contains("timed out"), "{}", verdict.reason);
    }

    #[tokio::test]
    async fn connection_refused_is_invalid() {
        // Port 1 on loopback, nothing listens there.
        let verdict = classifier_with_timeout(Duration::from_millis(500))
            .classify(entry("http://127.0.0.1:1/x"))
            .await;
        assert_eq!(verdict.status, LinkStatus::Invalid);
    }

    #[tokio::test]
    async fn malformed_url_is_invalid_without_probe() {
        let verdict = classifier().classify(entry("not a url at all")).await;
        assert_eq!(verdict.status, LinkStatus::Invalid);
        assert!(verdict.reason.contains("invalid URL"), "{}", verdict.reason);
    }

    #[tokio::test]
    async fn same_endpoint_classifies_identically_across_runs() {
        let server = MockServer::start().await;
        mock_head(
            &server,
            "/stable.ts",
            ResponseTemplate::new(200).insert_header("content-type", "video/mp2t"),
        )
        .await;

        let classifier = classifier();
        let url = format!("{}/stable.ts", server.uri());
        let first = classifier.classify(entry(&url)).await;
        let second = classifier.classify(entry(&url)).await;
        assert_eq!(first.status, second.status);
    }
}
