//! Per-band storage: the unsorted staging map filled by inserts and the
//! sorted bucket array that queries binary search.

use crate::hash_key::HashKey;
use std::collections::HashMap;

/// Insert-time table for one band: encoded key -> item keys.
pub type StagingTable = HashMap<HashKey, Vec<String>>;

/// Item keys that share one encoded band key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub key: HashKey,
    pub items: Vec<String>,
}

/// Searchable table for one band.
///
/// Buckets are sorted strictly ascending by key. The table only grows:
/// each build merges newly staged buckets into it and never drops one.
#[derive(Clone, Debug, Default)]
pub struct BandTable {
    buckets: Vec<Bucket>,
}

impl BandTable {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Total item keys across all buckets (an item may appear in several).
    pub fn item_count(&self) -> usize {
        self.buckets.iter().map(|b| b.items.len()).sum()
    }

    /// Merge a drained staging table into the sorted buckets.
    ///
    /// A key staged again after an earlier build is coalesced into the
    /// existing bucket so keys stay unique.
    pub(crate) fn absorb(&mut self, staged: StagingTable) {
        if staged.is_empty() {
            return;
        }
        self.buckets.reserve(staged.len());
        self.buckets
            .extend(staged.into_iter().map(|(key, items)| Bucket { key, items }));
        self.buckets.sort_by(|a, b| a.key.cmp(&b.key));
        self.buckets.dedup_by(|later, kept| {
            if later.key == kept.key {
                kept.items.append(&mut later.items);
                true
            } else {
                false
            }
        });
    }

    /// The contiguous run of buckets whose key starts with `prefix`.
    ///
    /// Keys in one table all have the same width, so comparing the first
    /// `prefix.len()` bytes keeps the sorted order and two binary searches
    /// bound the run.
    pub fn prefix_range(&self, prefix: &[u8]) -> &[Bucket] {
        let n = prefix.len();
        let start = self.buckets.partition_point(|b| key_head(&b.key, n) < prefix);
        let len = self.buckets[start..].partition_point(|b| key_head(&b.key, n) == prefix);
        &self.buckets[start..start + len]
    }
}

fn key_head(key: &[u8], n: usize) -> &[u8] {
    &key[..n.min(key.len())]
}
