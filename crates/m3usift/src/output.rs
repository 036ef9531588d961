//! Result aggregation and filtered-playlist serialization.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::classify::{LinkStatus, Verdict};

/// Aggregate counts over one run's verdicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub valid: usize,
    pub possibly_valid: usize,
    pub invalid: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.valid + self.possibly_valid + self.invalid + self.skipped
    }

    /// Entries that entered the worker pool.
    pub fn checked(&self) -> usize {
        self.total() - self.skipped
    }
}

pub fn summarize(verdicts: &[Verdict]) -> RunSummary {
    let mut summary = RunSummary::default();
    for verdict in verdicts {
        match verdict.status {
            LinkStatus::Valid => summary.valid += 1,
            LinkStatus::PossiblyValid => summary.possibly_valid += 1,
            LinkStatus::Invalid => summary.invalid += 1,
            LinkStatus::Skipped => summary.skipped += 1,
        }
    }
    summary
}

/// Output filename for today's run: `{prefix}{YYYY-MM-DD}.m3u`.
pub fn output_filename(prefix: &str) -> String {
    format!("{prefix}{}.m3u", Local::now().format("%Y-%m-%d"))
}

/// Write the surviving entries as a filtered playlist.
///
/// Filters to Valid / PossiblyValid verdicts and restores ascending
/// `original_index` order. Returns `None` without touching the filesystem
/// when nothing survived. A failure to create `output_dir` falls back to the
/// current directory; a write failure is reported and yields `None`, it does
/// not abort the run.
pub fn write_playlist(verdicts: &[Verdict], output_dir: &Path, prefix: &str) -> Option<PathBuf> {
    let mut playable: Vec<_> = verdicts
        .iter()
        .filter(|v| v.status.is_playable())
        .collect();
    if playable.is_empty() {
        info!("no playable entries to save");
        return None;
    }
    playable.sort_by_key(|v| v.entry.original_index);

    let dir = if output_dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        output_dir
    };
    let dir = match fs::create_dir_all(dir) {
        Ok(()) => dir,
        Err(e) => {
            warn!("failed to create output directory {}: {e}, falling back to current directory", dir.display());
            Path::new(".")
        }
    };

    let path = dir.join(output_filename(prefix));
    match write_entries(&path, &playable) {
        Ok(()) => {
            info!("saved {} playable entries to {}", playable.len(), path.display());
            Some(path)
        }
        Err(e) => {
            warn!("failed to write playlist {}: {e}", path.display());
            None
        }
    }
}

fn write_entries(path: &Path, playable: &[&Verdict]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "#EXTM3U")?;
    for verdict in playable {
        if let Some(metadata) = &verdict.entry.metadata {
            writeln!(file, "{metadata}")?;
        }
        writeln!(file, "{}", verdict.entry.url)?;
    }
    file.flush()
}
