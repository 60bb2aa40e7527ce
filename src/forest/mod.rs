//! LSH Forest: banded MinHash index with query-time K and L.
//!
//! ## Architecture
//!
//! ```text
//! signature: [ band 0: K values | band 1: K values | ... | band L-1 ]
//!                   |                   |                    |
//!                encode              encode               encode
//!                   ▼                   ▼                    ▼
//! insert ──►  StagingTable 0     StagingTable 1  ...  StagingTable L-1
//!                   |                   |                    |
//! build  ──►    BandTable 0        BandTable 1    ...   BandTable L-1
//!               (sorted)            (sorted)             (sorted)
//!                   ▲                   ▲                    ▲
//! query  ──►  prefix search       prefix search        prefix search
//!                   └──────── channel ─┴──── dedup ──────────┘
//! ```
//!
//! Items are invisible to queries until [`LshForest::build`] moves the
//! staging tables into the band tables. Every per-band step (encode and
//! stage, drain and sort, prefix search) runs on its own rayon task.
//!
//! ## Concurrency contract
//!
//! `insert` and `build` take `&mut self`; `query` takes `&self`. Any
//! number of queries may run together, never alongside a mutation. Wrap
//! the forest in [`crate::SharedForest`] when that discipline has to be
//! enforced at runtime across threads.
//!
//! # Example
//!
//! ```
//! use lshforest::{HashValueSize, LshForest};
//!
//! let mut forest = LshForest::new(2, 2, HashValueSize::Medium).unwrap();
//! forest.insert("a", &[1, 2, 3, 4]);
//! forest.insert("b", &[1, 9, 8, 7]);
//! forest.build();
//!
//! // Full K: only the first band of "b" differs in its second value.
//! assert_eq!(forest.query(&[1, 2, 3, 4], None, None), vec!["a".to_string()]);
//!
//! // K' = 1 matches on the first value of each band only.
//! let mut loose = forest.query(&[1, 2, 3, 4], Some(1), None);
//! loose.sort();
//! assert_eq!(loose, vec!["a".to_string(), "b".to_string()]);
//! ```

mod query;
mod table;

pub use table::{BandTable, Bucket, StagingTable};

use crate::config::ForestConfig;
use crate::error::Result;
use crate::hash_key::HashValueSize;
use rayon::prelude::*;

/// Snapshot of table sizes, summed over bands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForestStats {
    /// Distinct keys waiting in staging tables
    pub staged_entries: usize,
    /// Buckets in searchable band tables
    pub indexed_buckets: usize,
    /// Item keys held by those buckets
    pub indexed_items: usize,
}

/// MinHash LSH index organized as L sorted band tables.
#[derive(Debug)]
pub struct LshForest {
    max_k: usize,
    max_l: usize,
    hash_value_size: HashValueSize,
    staging: Vec<StagingTable>,
    bands: Vec<BandTable>,
    /// Dedicated pool; `None` runs on the global rayon pool
    pool: Option<rayon::ThreadPool>,
}

impl LshForest {
    /// Create an empty forest with `max_l` bands of `max_k` hash values.
    pub fn new(max_k: usize, max_l: usize, hash_value_size: HashValueSize) -> Result<Self> {
        Self::from_config(&ForestConfig {
            max_k,
            max_l,
            hash_value_size,
            num_threads: 0,
        })
    }

    pub fn from_config(config: &ForestConfig) -> Result<Self> {
        config.validate()?;

        let pool = if config.num_threads > 0 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(config.num_threads)
                    .thread_name(|i| format!("lshforest-band-{i}"))
                    .build()?,
            )
        } else {
            None
        };

        tracing::debug!(
            max_k = config.max_k,
            max_l = config.max_l,
            hash_value_size = %config.hash_value_size,
            num_threads = config.num_threads,
            "forest_created"
        );

        Ok(Self {
            max_k: config.max_k,
            max_l: config.max_l,
            hash_value_size: config.hash_value_size,
            staging: (0..config.max_l).map(|_| StagingTable::new()).collect(),
            bands: vec![BandTable::default(); config.max_l],
            pool,
        })
    }

    /// Hash values per band.
    pub fn max_k(&self) -> usize {
        self.max_k
    }

    /// Number of bands.
    pub fn max_l(&self) -> usize {
        self.max_l
    }

    pub fn hash_value_size(&self) -> HashValueSize {
        self.hash_value_size
    }

    /// Minimum signature length accepted by `insert` and `query`.
    pub fn signature_len(&self) -> usize {
        self.max_k * self.max_l
    }

    /// Searchable band tables, one per band.
    pub fn band_tables(&self) -> &[BandTable] {
        &self.bands
    }

    /// True if no bucket has been built yet. Staged items do not count.
    pub fn is_empty(&self) -> bool {
        self.bands.iter().all(BandTable::is_empty)
    }

    pub fn stats(&self) -> ForestStats {
        ForestStats {
            staged_entries: self.staging.iter().map(StagingTable::len).sum(),
            indexed_buckets: self.bands.iter().map(BandTable::len).sum(),
            indexed_items: self.bands.iter().map(BandTable::item_count).sum(),
        }
    }

    /// Stage `item_key` under each of its band keys.
    ///
    /// The key is not searchable until the next [`build`](Self::build).
    /// Bands are encoded and staged in parallel.
    ///
    /// # Panics
    ///
    /// Panics if `signature` holds fewer than `max_k * max_l` values.
    pub fn insert(&mut self, item_key: &str, signature: &[u64]) {
        self.check_signature(signature);

        let k = self.max_k;
        let size = self.hash_value_size;
        let staging = &mut self.staging;
        in_pool(self.pool.as_ref(), || {
            staging.par_iter_mut().enumerate().for_each(|(i, table)| {
                let key = size.encode(&signature[i * k..(i + 1) * k]);
                table.entry(key).or_default().push(item_key.to_string());
            });
        });
    }

    /// Make every staged item searchable.
    ///
    /// Each band drains its staging table into its band table in parallel.
    /// Previously built buckets are kept, so repeated builds only add.
    pub fn build(&mut self) {
        let staging = &mut self.staging;
        let bands = &mut self.bands;
        let staged: usize = in_pool(self.pool.as_ref(), || {
            bands
                .par_iter_mut()
                .zip(staging.par_iter_mut())
                .map(|(band, table)| {
                    let drained = std::mem::take(table);
                    let n = drained.len();
                    band.absorb(drained);
                    n
                })
                .sum()
        });

        tracing::debug!(
            bands = self.max_l,
            staged_entries = staged,
            indexed_buckets = self.bands.iter().map(BandTable::len).sum::<usize>(),
            "forest_built"
        );
    }

    fn check_signature(&self, signature: &[u64]) {
        assert!(
            signature.len() >= self.signature_len(),
            "signature has {} hash values, forest needs at least {} (k={} x l={})",
            signature.len(),
            self.signature_len(),
            self.max_k,
            self.max_l
        );
    }
}

/// Run `op` on the forest's dedicated pool if it has one.
fn in_pool<R: Send>(pool: Option<&rayon::ThreadPool>, op: impl FnOnce() -> R + Send) -> R {
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}
