use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) M3U-Sift/0.1";

/// Maximum redirect hops followed before a probe is abandoned.
pub const MAX_REDIRECTS: usize = 10;

/// Configurable options for one validation run.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each individual link probe.
    pub probe_timeout: Duration,

    /// Timeout for fetching the playlist itself.
    pub download_timeout: Duration,

    /// Upper bound on concurrently executing probes.
    pub max_workers: usize,

    /// User agent sent with the playlist fetch and every probe.
    pub user_agent: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(10),
            download_timeout: Duration::from_secs(45),
            max_workers: 10,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CheckerConfig::default();
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert_eq!(config.download_timeout, Duration::from_secs(45));
        assert_eq!(config.max_workers, 10);
    }
}
