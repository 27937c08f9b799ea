//! Pure membership-array helpers.
//!
//! Every write path deduplicates here rather than trusting callers: the
//! bulk orchestrator composes ids from multiple sources (name matches,
//! fresh creates, caller input) that can coincide.

use std::collections::HashSet;

use uuid::Uuid;

/// Deduplicate while preserving first-occurrence order.
pub(crate) fn dedup_ids(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Append `id` unless already present. Returns `None` when the array is
/// unchanged, so callers can skip the store write entirely.
pub(crate) fn append_if_absent(current: &[Uuid], id: Uuid) -> Option<Vec<Uuid>> {
    if current.contains(&id) {
        return None;
    }
    let mut next = current.to_vec();
    next.push(id);
    Some(next)
}

/// Set difference, preserving the order of `current`.
pub(crate) fn difference(current: &[Uuid], remove: &[Uuid]) -> Vec<Uuid> {
    current
        .iter()
        .copied()
        .filter(|id| !remove.contains(id))
        .collect()
}
