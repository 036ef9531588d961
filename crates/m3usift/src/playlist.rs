//! M3U playlist parsing: raw text lines into ordered stream entries.

use std::sync::Arc;

use tracing::warn;

/// One playlist item.
///
/// Immutable after parsing; probe tasks share it via `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The `#EXTINF:` line preceding the URL, carried verbatim.
    pub metadata: Option<String>,
    /// Probe target. Not required to be HTTP(S).
    pub url: String,
    /// 1-based position among parsed entries, used to restore output order.
    pub original_index: usize,
}

impl Entry {
    /// Whether this entry is eligible for an HTTP probe.
    pub fn is_http(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }

    /// Display label for logs: the metadata line when present, else the URL.
    pub fn label(&self) -> &str {
        self.metadata.as_deref().unwrap_or(&self.url)
    }
}

/// Parse M3U content lines into ordered entries.
///
/// `#EXTINF:` lines are buffered as pending metadata for the next URL line.
/// Other `#` lines are comments and are dropped without touching the pending
/// metadata. Blank lines are ignored and consume no index. Every remaining
/// line becomes an [`Entry`] carrying the pending metadata (cleared after
/// use) and the next sequential index starting at 1.
pub fn parse_playlist<I, S>(lines: I) -> Vec<Arc<Entry>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = Vec::new();
    let mut pending_metadata: Option<String> = None;

    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("#EXTINF:") {
            pending_metadata = Some(line.to_owned());
        } else if line.starts_with('#') {
            // Comment or directive we do not interpret.
        } else {
            entries.push(Arc::new(Entry {
                metadata: pending_metadata.take(),
                url: line.to_owned(),
                original_index: entries.len() + 1,
            }));
        }
    }

    if entries.is_empty() {
        warn!("no stream entries parsed from playlist content");
    }
    entries
}
