//! Concurrent collection across all source feeds, then merge-sort-truncate.
//!
//! One independent task per source URI, fanned out with a bounded
//! `buffer_unordered` pool. Tasks send surviving items into a channel owned
//! by this module — the only shared structure — and the channel is drained
//! after every task has reached a terminal state. Ordering is imposed only
//! afterwards, by [`finalize`].

use crate::config::RunPolicy;
use crate::feed::fetch::{fetch_source, SourceError};
use crate::feed::normalize::{normalize, Decision, FeedItem};
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;

/// Max feeds fetched simultaneously.
const MAX_CONCURRENT_FETCHES: usize = 8;

/// Per-source item counts for a source that fetched successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStats {
    pub kept: usize,
    pub skipped: usize,
}

/// Terminal state of one source's task.
#[derive(Debug)]
pub struct SourceOutcome {
    pub uri: String,
    pub result: Result<SourceStats, SourceError>,
}

/// Everything the fan-out produced: the unordered item pool plus one outcome
/// per configured source.
#[derive(Debug)]
pub struct Harvest {
    pub items: Vec<FeedItem>,
    pub sources: Vec<SourceOutcome>,
}

/// Fetches and normalizes all source feeds concurrently.
///
/// Guarantees:
/// - Tasks are independent; a failed or slow source never blocks or corrupts
///   another source's contribution.
/// - Every successfully normalized item appears exactly once in
///   `Harvest::items`.
/// - Returns only after every task has finished. Per-source failures are
///   logged and reported in `Harvest::sources`, never raised.
/// - No ordering guarantee on `items` — call [`finalize`] for that.
pub async fn collect(client: &reqwest::Client, uris: &[String], policy: &RunPolicy) -> Harvest {
    if uris.is_empty() {
        return Harvest {
            items: Vec::new(),
            sources: Vec::new(),
        };
    }

    let (tx, mut rx) = mpsc::unbounded_channel();

    let sources: Vec<SourceOutcome> = stream::iter(uris.iter().cloned())
        .map(|uri| {
            let client = client.clone();
            let tx = tx.clone();
            let policy = *policy;

            async move {
                let result = harvest_one(&client, &uri, &policy, &tx).await;
                if let Err(e) = &result {
                    tracing::warn!(uri = %uri, cause = %e.kind, "Ignoring feed");
                }
                SourceOutcome { uri, result }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_FETCHES)
        .collect()
        .await;

    // All task-held senders are gone once the stream completes; dropping the
    // original closes the channel so the drain below terminates.
    drop(tx);

    let mut items = Vec::new();
    while let Some(item) = rx.recv().await {
        items.push(item);
    }

    Harvest { items, sources }
}

async fn harvest_one(
    client: &reqwest::Client,
    uri: &str,
    policy: &RunPolicy,
    tx: &mpsc::UnboundedSender<FeedItem>,
) -> Result<SourceStats, SourceError> {
    let source = fetch_source(client, uri).await?;
    let source_title = source.title.as_deref();

    let mut stats = SourceStats {
        kept: 0,
        skipped: 0,
    };
    for entry in source.entries {
        match normalize(entry, source_title, policy) {
            Decision::Keep(item) => {
                // Send only fails if the receiver is gone, which cannot
                // happen before collect() drains.
                if tx.send(item).is_ok() {
                    stats.kept += 1;
                }
            }
            Decision::Skip { id, reason } => {
                stats.skipped += 1;
                tracing::debug!(
                    uri = %uri,
                    item = %id.as_deref().unwrap_or("(unknown id)"),
                    reason = %reason,
                    "Skipping item"
                );
            }
        }
    }

    tracing::info!(uri = %uri, kept = stats.kept, skipped = stats.skipped, "Collected feed");
    Ok(stats)
}

/// Orders the collected items and applies the count limit.
///
/// Stable sort, descending by effective publish time; undated items compare
/// as the minimum and therefore sort last. When `max_items` is `Some(n)`,
/// only the newest `n` survive.
pub fn finalize(mut items: Vec<FeedItem>, max_items: Option<usize>) -> Vec<FeedItem> {
    items.sort_by(|a, b| b.published.cmp(&a.published));
    if let Some(n) = max_items {
        items.truncate(n);
    }
    items
}
