//! LSH Ensemble: containment search across domains of very different sizes.
//!
//! Domains are split by size into partitions, each backed by its own
//! [`LshForest`]. Because the containment-to-Jaccard mapping depends on the
//! indexed size, every partition is queried with the (K, L) that is optimal
//! for its upper size bound, the query size and the threshold.
//!
//! ```text
//! LshEnsemble
//!   |-- Partition [1, 40]      -> LshForest   queried with (k1, l1)
//!   |-- Partition [41, 300]    -> LshForest   queried with (k2, l2)
//!   `-- Partition [301, 9000]  -> LshForest   queried with (k3, l3)
//! ```
//!
//! Optimal parameters are memoized per (partition upper bound, query size,
//! threshold), so repeated queries at the same size skip the grid search.

mod partition;

pub use partition::{equi_depth_partitions, Partition};

use crate::config::{Config, ForestConfig};
use crate::error::{LshError, Result};
use crate::forest::LshForest;
use crate::optimizer::optimal_params;
use crate::probability::{ContainmentModel, ProbabilityModel};
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// One domain to index: its key, its distinct-value count and its signature
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainRecord {
    pub key: String,
    pub size: usize,
    pub signature: Vec<u64>,
}

impl DomainRecord {
    pub fn new(key: impl Into<String>, size: usize, signature: Vec<u64>) -> Self {
        Self {
            key: key.into(),
            size,
            signature,
        }
    }
}

/// Memo key: (indexed size, query size, threshold bits)
type ParamKey = (usize, usize, u64);

/// Size-partitioned collection of LSH forests.
pub struct LshEnsemble {
    partitions: Vec<Partition>,
    forests: Vec<LshForest>,
    model: Arc<dyn ProbabilityModel>,
    param_cache: DashMap<ParamKey, (usize, usize)>,
}

impl std::fmt::Debug for LshEnsemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LshEnsemble")
            .field("partitions", &self.partitions)
            .field("forests", &self.forests)
            .field("cached_params", &self.param_cache.len())
            .finish_non_exhaustive()
    }
}

impl LshEnsemble {
    /// Create an empty ensemble with one forest of shape `forest` per
    /// partition.
    pub fn new(partitions: Vec<Partition>, forest: &ForestConfig) -> Result<Self> {
        partition::validate_partitions(&partitions).map_err(LshError::InvalidParameter)?;
        let forests = partitions
            .iter()
            .map(|_| LshForest::from_config(forest))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            partitions,
            forests,
            model: Arc::new(ContainmentModel),
            param_cache: DashMap::new(),
        })
    }

    /// Replace the error model used to pick per-partition parameters.
    pub fn with_model(mut self, model: Arc<dyn ProbabilityModel>) -> Self {
        self.model = model;
        self.param_cache.clear();
        self
    }

    /// Partition `records` equi-depth by size, index them all and build.
    pub fn bootstrap(records: Vec<DomainRecord>, config: &Config) -> Result<Self> {
        config.validate()?;
        if records.is_empty() {
            return Err(LshError::InvalidParameter(
                "cannot bootstrap an ensemble from zero records".to_string(),
            ));
        }

        if let Some(empty) = records.iter().find(|r| r.size == 0) {
            return Err(empty_domain(&empty.key));
        }

        let sizes: Vec<usize> = records.iter().map(|r| r.size).collect();
        let partitions = equi_depth_partitions(&sizes, config.ensemble.num_partitions);
        let mut ensemble = Self::new(partitions, &config.forest)?;
        for record in &records {
            ensemble.insert(&record.key, record.size, &record.signature)?;
        }
        ensemble.build();

        tracing::debug!(
            records = records.len(),
            partitions = ensemble.partitions.len(),
            "ensemble_bootstrapped"
        );
        Ok(ensemble)
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn forests(&self) -> &[LshForest] {
        &self.forests
    }

    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forests.iter().all(LshForest::is_empty)
    }

    /// Stage a domain in the forest of the partition covering `size`.
    ///
    /// Domains with no values are rejected; they cannot contain any part
    /// of a query.
    ///
    /// # Panics
    ///
    /// Panics if `signature` is shorter than the forest signature length.
    pub fn insert(&mut self, key: &str, size: usize, signature: &[u64]) -> Result<()> {
        if size == 0 {
            return Err(empty_domain(key));
        }
        let idx = self
            .partition_index(size)
            .ok_or(LshError::NoPartition { size })?;
        self.forests[idx].insert(key, signature);
        Ok(())
    }

    /// Build every partition's forest in parallel.
    pub fn build(&mut self) {
        self.forests.par_iter_mut().for_each(LshForest::build);
    }

    /// Domains whose containment of the query likely reaches `threshold`.
    ///
    /// Partitions whose largest domain is smaller than `threshold * size`
    /// cannot contain that many of the query's values and are skipped.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero, `threshold` is outside `[0, 1]`, or the
    /// signature is too short.
    pub fn query(&self, signature: &[u64], size: usize, threshold: f64) -> Vec<String> {
        assert!(size > 0, "query domain size must be > 0");
        assert!(
            (0.0..=1.0).contains(&threshold),
            "threshold must be in [0, 1], got {threshold}"
        );

        let min_upper = threshold * size as f64;
        let per_partition: Vec<Vec<String>> = self
            .partitions
            .par_iter()
            .zip(self.forests.par_iter())
            .filter(|(p, _)| p.upper as f64 >= min_upper)
            .map(|(p, forest)| {
                let (k, l) = self.params_for(forest, p.upper, size, threshold);
                forest.query(signature, Some(k), Some(l))
            })
            .collect();

        let mut seen = HashSet::new();
        let results: Vec<String> = per_partition
            .into_iter()
            .flatten()
            .filter(|key| seen.insert(key.clone()))
            .collect();

        tracing::trace!(size, threshold, candidates = results.len(), "ensemble_query");
        results
    }

    fn params_for(&self, forest: &LshForest, x: usize, q: usize, t: f64) -> (usize, usize) {
        let key = (x, q, t.to_bits());
        if let Some(cached) = self.param_cache.get(&key) {
            return *cached;
        }
        let best = optimal_params(forest.max_k(), forest.max_l(), x, q, t, self.model.as_ref());
        self.param_cache.insert(key, (best.k, best.l));
        (best.k, best.l)
    }

    /// Number of memoized (K, L) choices.
    pub fn cached_params(&self) -> usize {
        self.param_cache.len()
    }

    fn partition_index(&self, size: usize) -> Option<usize> {
        let idx = self.partitions.partition_point(|p| p.upper < size);
        self.partitions
            .get(idx)
            .filter(|p| p.contains(size))
            .map(|_| idx)
    }
}

fn empty_domain(key: &str) -> LshError {
    LshError::InvalidParameter(format!("domain {key:?} has size 0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_key::HashValueSize;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.forest.max_k = 2;
        config.forest.max_l = 4;
        config.forest.hash_value_size = HashValueSize::Wide;
        config.ensemble.num_partitions = 3;
        config
    }

    fn record(i: u64, size: usize) -> DomainRecord {
        DomainRecord::new(
            format!("d{i}"),
            size,
            (0..8).map(|j| i * 1000 + j).collect(),
        )
    }

    #[test]
    fn test_bootstrap_finds_every_record() {
        let records: Vec<DomainRecord> = (0..30).map(|i| record(i, (i as usize + 1) * 10)).collect();
        let ensemble = LshEnsemble::bootstrap(records.clone(), &small_config()).unwrap();
        assert_eq!(ensemble.len(), 3);
        assert!(!ensemble.is_empty());

        for r in &records {
            let found = ensemble.query(&r.signature, r.size, 1.0);
            assert_eq!(found, vec![r.key.clone()]);
            assert!(ensemble.query(&r.signature, r.size, 0.5).contains(&r.key));
        }
    }

    #[test]
    fn test_bootstrap_requires_records() {
        assert!(matches!(
            LshEnsemble::bootstrap(Vec::new(), &small_config()),
            Err(LshError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_insert_outside_partitions() {
        let mut ensemble = LshEnsemble::new(
            vec![Partition { lower: 10, upper: 20 }],
            &small_config().forest,
        )
        .unwrap();
        assert!(matches!(
            ensemble.insert("x", 5, &[0; 8]),
            Err(LshError::NoPartition { size: 5 })
        ));
        assert!(ensemble.insert("x", 21, &[0; 8]).is_err());
        assert!(ensemble.insert("x", 15, &[0; 8]).is_ok());
    }

    #[test]
    fn test_small_partitions_are_pruned() {
        let partitions = vec![
            Partition { lower: 1, upper: 10 },
            Partition { lower: 11, upper: 1000 },
        ];
        let mut ensemble = LshEnsemble::new(partitions, &small_config().forest).unwrap();
        ensemble.insert("small", 5, &[7; 8]).unwrap();
        ensemble.insert("large", 500, &[7; 8]).unwrap();
        ensemble.build();

        // Containment 0.5 of a 100-value query needs at least 50 values.
        assert_eq!(ensemble.query(&[7; 8], 100, 0.5), vec!["large".to_string()]);

        let mut both = ensemble.query(&[7; 8], 10, 0.5);
        both.sort();
        assert_eq!(both, vec!["large".to_string(), "small".to_string()]);
    }

    #[test]
    fn test_params_are_memoized() {
        let records: Vec<DomainRecord> = (0..6).map(|i| record(i, 10 + i as usize)).collect();
        let ensemble = LshEnsemble::bootstrap(records, &small_config()).unwrap();
        let sig: Vec<u64> = (0..8).collect();

        ensemble.query(&sig, 12, 0.0);
        let cached = ensemble.cached_params();
        assert_eq!(cached, ensemble.len());
        ensemble.query(&sig, 12, 0.0);
        assert_eq!(ensemble.cached_params(), cached);
    }

    #[test]
    fn test_rejects_invalid_partitions() {
        let overlapping = vec![
            Partition { lower: 1, upper: 10 },
            Partition { lower: 10, upper: 20 },
        ];
        assert!(LshEnsemble::new(overlapping, &ForestConfig::default()).is_err());
        assert!(LshEnsemble::new(Vec::new(), &ForestConfig::default()).is_err());
    }

    #[test]
    fn test_empty_domains_are_rejected() {
        let records = vec![
            DomainRecord::new("empty", 0, vec![5, 6, 7, 8, 1, 2, 3, 4]),
            DomainRecord::new("full", 10, vec![5, 6, 7, 8, 1, 2, 3, 4]),
        ];
        assert!(matches!(
            LshEnsemble::bootstrap(records.clone(), &small_config()),
            Err(LshError::InvalidParameter(_))
        ));

        let ensemble = LshEnsemble::bootstrap(records[1..].to_vec(), &small_config()).unwrap();
        assert_eq!(ensemble.query(&records[1].signature, 10, 0.0), vec!["full".to_string()]);

        let mut manual = LshEnsemble::new(
            vec![Partition { lower: 1, upper: 10 }],
            &small_config().forest,
        )
        .unwrap();
        assert!(matches!(
            manual.insert("empty", 0, &[0; 8]),
            Err(LshError::InvalidParameter(_))
        ));
        assert!(LshEnsemble::new(
            vec![Partition { lower: 0, upper: 10 }],
            &small_config().forest
        )
        .is_err());
    }

    /// Zero error for one fixed (k, l), full error everywhere else.
    struct FixedModel {
        k: usize,
        l: usize,
    }

    impl ProbabilityModel for FixedModel {
        fn false_positive(&self, _: usize, _: usize, l: usize, k: usize, _: f64, _: f64) -> f64 {
            if (k, l) == (self.k, self.l) {
                0.0
            } else {
                1.0
            }
        }

        fn false_negative(&self, _: usize, _: usize, _: usize, _: usize, _: f64, _: f64) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_with_model_drives_params_and_resets_cache() {
        let records: Vec<DomainRecord> = (0..6).map(|i| record(i, 10 + i as usize)).collect();
        let sig: Vec<u64> = (0..8).collect();

        let ensemble = LshEnsemble::bootstrap(records, &small_config())
            .unwrap()
            .with_model(Arc::new(FixedModel { k: 1, l: 3 }));
        assert_eq!(ensemble.cached_params(), 0);
        ensemble.query(&sig, 12, 0.5);
        assert!(ensemble.cached_params() > 0);
        assert!(ensemble.param_cache.iter().all(|entry| *entry.value() == (1, 3)));

        let ensemble = ensemble.with_model(Arc::new(FixedModel { k: 2, l: 2 }));
        assert_eq!(ensemble.cached_params(), 0);
        ensemble.query(&sig, 12, 0.5);
        assert!(ensemble.cached_params() > 0);
        assert!(ensemble.param_cache.iter().all(|entry| *entry.value() == (2, 2)));
    }
}
