use std::collections::{BTreeMap, BTreeSet};

use crate::error::GitTheseusError;
use crate::git::backend::HistoryBackend;
use crate::utils::debug_log;

/// One step of the timeline: a commit and every descriptor spelling that names it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    /// Full id as resolved by the repository.
    pub resolved: String,
    /// Descriptor ids (full or abbreviated) that resolve to `resolved`.
    pub spellings: Vec<String>,
}

/// Order the descriptor's commit ids oldest ancestor first.
///
/// Ids that name the same commit are folded into a single entry, so the
/// commit is replayed once with all of its lines.
pub fn order_commit_ids<B: HistoryBackend + ?Sized>(
    backend: &B,
    ids: &BTreeSet<String>,
) -> Result<Vec<TimelineEntry>, GitTheseusError> {
    let mut by_resolved: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for id in ids {
        let resolved = backend.resolve_commit(id).map_err(|e| {
            GitTheseusError::OrderingError(format!(
                "'{}' does not resolve to a commit: {}",
                id, e
            ))
        })?;
        by_resolved.entry(resolved).or_default().push(id.clone());
    }

    let resolved: Vec<String> = by_resolved.keys().cloned().collect();
    let ordered = backend.topo_order(&resolved).map_err(|e| {
        GitTheseusError::OrderingError(format!("failed to sort commits topologically: {}", e))
    })?;

    if ordered.len() != resolved.len() {
        return Err(GitTheseusError::OrderingError(format!(
            "ancestry query returned {} commits for {} requested",
            ordered.len(),
            resolved.len()
        )));
    }

    let mut timeline = Vec::with_capacity(ordered.len());
    for oid in ordered {
        let spellings = by_resolved.remove(&oid).ok_or_else(|| {
            GitTheseusError::OrderingError(format!(
                "ancestry query returned unexpected or repeated commit {}",
                oid
            ))
        })?;
        timeline.push(TimelineEntry {
            resolved: oid,
            spellings,
        });
    }

    debug_log(&format!(
        "Ordered timeline: {}",
        timeline
            .iter()
            .map(|entry| entry.resolved.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    ));
    Ok(timeline)
}
