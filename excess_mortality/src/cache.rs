use log::debug;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::*;

// Revisions are unique across all the sources of the process, so that a
// cache never mistakes two different sources for the same data.
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// The two source tables, as loaded once by the caller.
///
/// Every mutation assigns a new revision, which invalidates the comparisons
/// cached from an older revision. Clones share the revision of their origin
/// until one of them is modified.
#[derive(PartialEq, Debug, Clone)]
pub struct Sources {
    mortality: Vec<MortalityRecord>,
    vaccination: Vec<VaccinationRecord>,
    revision: u64,
}

impl Sources {
    pub fn new(mortality: Vec<MortalityRecord>, vaccination: Vec<VaccinationRecord>) -> Sources {
        Sources {
            mortality,
            vaccination,
            revision: next_revision(),
        }
    }

    pub fn mortality(&self) -> &[MortalityRecord] {
        &self.mortality
    }

    pub fn vaccination(&self) -> &[VaccinationRecord] {
        &self.vaccination
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn replace_mortality(&mut self, records: Vec<MortalityRecord>) {
        self.mortality = records;
        self.revision = next_revision();
    }

    pub fn replace_vaccination(&mut self, records: Vec<VaccinationRecord>) {
        self.vaccination = records;
        self.revision = next_revision();
    }

    pub(crate) fn push_mortality(&mut self, record: MortalityRecord) {
        self.mortality.push(record);
        self.revision = next_revision();
    }

    pub(crate) fn push_vaccination(&mut self, record: VaccinationRecord) {
        self.vaccination.push(record);
        self.revision = next_revision();
    }
}

impl Default for Sources {
    fn default() -> Self {
        Sources::new(Vec::new(), Vec::new())
    }
}

/// Memoizes the comparison tables by `(cutoff, metric)`.
///
/// ```
/// use excess_mortality::cache::{ComparisonCache, Sources};
/// use excess_mortality::ComparisonParams;
///
/// let sources = Sources::new(vec![], vec![]);
/// let mut cache = ComparisonCache::new();
/// let rows = cache.get_or_compute(&sources, &ComparisonParams::default());
/// assert!(rows.is_empty());
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComparisonCache {
    entries: HashMap<ComparisonParams, Vec<ComparisonRow>>,
    // Revision of the sources the entries were computed from.
    revision: Option<u64>,
    hits: u64,
    misses: u64,
}

impl ComparisonCache {
    pub fn new() -> ComparisonCache {
        ComparisonCache::default()
    }

    /// Returns the comparison for these parameters, computing it only if it
    /// was not already computed from the same revision of the sources.
    pub fn get_or_compute(&mut self, sources: &Sources, params: &ComparisonParams) -> &[ComparisonRow] {
        if self.revision != Some(sources.revision()) {
            if !self.entries.is_empty() {
                debug!(
                    "get_or_compute: sources changed ({:?} -> {}), dropping {} entries",
                    self.revision,
                    sources.revision(),
                    self.entries.len()
                );
            }
            self.entries.clear();
            self.revision = Some(sources.revision());
        }

        if self.entries.contains_key(params) {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        debug!(
            "get_or_compute: {:?} hits: {} misses: {}",
            params, self.hits, self.misses
        );
        self.entries
            .entry(*params)
            .or_insert_with(|| crate::compare(sources.mortality(), sources.vaccination(), params))
    }

    /// Drops every cached comparison.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.revision = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
