//! Loading the raw playlist text, from an HTTP(S) URL or a local file.

use std::path::Path;

use tracing::{debug, info};

use crate::config::CheckerConfig;
use crate::error::SiftError;

/// Fetch or read the playlist and split it into lines.
///
/// Sources starting with `http://` or `https://` are downloaded with the
/// configured download timeout; anything else is treated as a local path.
/// Failures here are the only fatal errors of a run.
pub async fn load_playlist(source: &str, config: &CheckerConfig) -> Result<Vec<String>, SiftError> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_remote(source, config).await?
    } else {
        info!("reading playlist from local file: {source}");
        tokio::fs::read(Path::new(source)).await?
    };
    Ok(decode_lines(&bytes))
}

async fn fetch_remote(url: &str, config: &CheckerConfig) -> Result<Vec<u8>, SiftError> {
    info!("downloading playlist from {url}");
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.download_timeout)
        .build()?;
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SiftError::http_status(status, url));
    }
    Ok(response.bytes().await?.to_vec())
}

/// Decode playlist bytes as UTF-8, falling back to Latin-1.
fn decode_lines(bytes: &[u8]) -> Vec<String> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => {
            debug!("playlist is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    };
    text.lines().map(str::to_owned).collect()
}
