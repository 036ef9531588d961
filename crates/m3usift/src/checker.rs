//! Concurrent fan-out of link probes over a bounded worker pool.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::classify::{LinkClassifier, LinkStatus, Verdict};
use crate::config::CheckerConfig;
use crate::error::SiftError;
use crate::playlist::Entry;

/// Runs the [`LinkClassifier`] over a batch of entries with bounded
/// parallelism.
///
/// Results are collected in completion order; callers needing the original
/// playlist order sort by `original_index` downstream. Progress counters are
/// owned by each `check_all` call, so concurrent runs do not interfere.
pub struct LinkChecker {
    classifier: Arc<LinkClassifier>,
    max_workers: usize,
}

impl LinkChecker {
    pub fn new(config: &CheckerConfig) -> Result<Self, SiftError> {
        if config.max_workers == 0 {
            return Err(SiftError::configuration("max_workers must be at least 1"));
        }
        Ok(Self {
            classifier: Arc::new(LinkClassifier::new(config)?),
            max_workers: config.max_workers,
        })
    }

    /// Probe every HTTP(S) entry, at most `max_workers` at a time.
    ///
    /// Non-HTTP(S) entries become `Skipped` verdicts without a network call.
    /// A probe task that fails at the pool layer (panic or cancellation) is
    /// converted into an `Invalid` verdict for that entry alone; one broken
    /// task never aborts the batch.
    pub async fn check_all(&self, entries: &[Arc<Entry>]) -> Vec<Verdict> {
        let mut verdicts = Vec::with_capacity(entries.len());
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        let mut task_entries: HashMap<tokio::task::Id, Arc<Entry>> = HashMap::new();

        for entry in entries {
            if !entry.is_http() {
                info!(url = %entry.url, "skipping non-HTTP(S) entry");
                verdicts.push(Verdict::skipped(entry.clone()));
                continue;
            }
            let classifier = self.classifier.clone();
            let semaphore = semaphore.clone();
            let task_entry = entry.clone();
            let handle = tasks.spawn(async move {
                // The semaphore outlives every task, so acquisition only
                // fails if the runtime is shutting down.
                let _permit = semaphore.acquire_owned().await.ok();
                classifier.classify(task_entry).await
            });
            task_entries.insert(handle.id(), entry.clone());
        }

        let total = task_entries.len();
        info!(
            "checking {total} HTTP(S) entries ({} skipped) with up to {} workers",
            verdicts.len(),
            self.max_workers
        );

        let mut processed = 0usize;
        while let Some(result) = tasks.join_next_with_id().await {
            processed += 1;
            let verdict = match result {
                Ok((id, verdict)) => {
                    task_entries.remove(&id);
                    verdict
                }
                Err(join_error) => {
                    let entry = task_entries.remove(&join_error.id());
                    warn!("probe task failed at the pool layer: {join_error}");
                    match entry {
                        Some(entry) => Verdict::new(
                            entry,
                            LinkStatus::Invalid,
                            format!("orchestration error: {join_error}"),
                        ),
                        // Unreachable: every spawned task id is recorded.
                        None => continue,
                    }
                }
            };
            info!(
                "[{processed}/{total}] {} -> {}: {}",
                truncate_url(&verdict.entry.url),
                verdict.status,
                verdict.reason
            );
            verdicts.push(verdict);
        }

        verdicts
    }
}

/// Shorten long URLs for progress lines.
fn truncate_url(url: &str) -> String {
    const MAX: usize = 60;
    if url.len() > MAX {
        let cut = url
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|&i| i <= MAX)
            .last()
            .unwrap_or(0);
        format!("{}...", &url[..cut])
    } else {
        url.to_owned()
    }
}
