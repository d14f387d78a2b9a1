use std::collections::BTreeMap;

use super::catalog::StageCatalog;
use super::domain::{StatusId, TransitionRecord};

/// Sparse map from history index to the statuses skipped at that step.
/// Indices with no skip are absent, not present as empty vectors; consumers
/// test membership to decide whether to render a skip warning.
pub type SkipMap = BTreeMap<usize, Vec<StatusId>>;

/// The status-history API returns records newest-first. Pairwise skip
/// reconstruction needs them oldest-first, so the reversal is an explicit,
/// named step rather than an assumption about API order.
pub fn oldest_first(mut records: Vec<TransitionRecord>) -> Vec<TransitionRecord> {
    records.reverse();
    records
}

/// Recompute, per record, which statuses were skipped relative to the
/// immediately preceding record — independent of how the transition
/// originally occurred. Soft-deleted compensation records still participate.
/// Records whose status the catalog does not know contribute no skips.
///
/// Derived on every fetch; never persisted.
pub fn reconstruct(records: &[TransitionRecord], catalog: &StageCatalog) -> SkipMap {
    let mut skipped = SkipMap::new();

    for (index, window) in records.windows(2).enumerate() {
        let previous = catalog.index_of(&window[0].status);
        let current = catalog.index_of(&window[1].status);

        if let (Some(previous), Some(current)) = (previous, current) {
            if current > previous + 1 {
                skipped.insert(index + 1, catalog.slice_between(previous, current));
            }
        }
    }

    skipped
}

/// Reconstructed history for one applicant: the oldest-first records plus
/// the derived skip map.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StatusHistory {
    pub records: Vec<TransitionRecord>,
    pub skipped: SkipMap,
}

impl StatusHistory {
    /// Build from the API's newest-first record list.
    pub fn from_newest_first(records: Vec<TransitionRecord>, catalog: &StageCatalog) -> Self {
        let records = oldest_first(records);
        let skipped = reconstruct(&records, catalog);
        Self { records, skipped }
    }

    /// At least one record survives soft deletion; gates the history
    /// affordance in consuming views.
    pub fn has_visible_records(&self) -> bool {
        self.records.iter().any(|record| !record.deleted)
    }
}
