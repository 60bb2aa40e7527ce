//! # lshforest
//!
//! Approximate set containment search over MinHash signatures using an
//! LSH Forest, plus the size-partitioned LSH Ensemble built on top of it.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! MinHash signature (caller supplied, K*L hash values)
//!     ↓
//! [hash_key]     → one fixed-width byte key per band
//!     ↓
//! [forest]       insert → staging tables
//!                build  → sorted band tables
//!                query  → parallel prefix search + dedup
//!     ↑
//! [optimizer]    (K, L) minimizing FP + FN via [probability]
//!     ↑
//! [ensemble]     one forest per domain-size partition
//! ```
//!
//! ## Usage
//!
//! ```
//! use lshforest::{HashValueSize, LshForest};
//!
//! let mut forest = LshForest::new(4, 4, HashValueSize::Medium).unwrap();
//! let sig: Vec<u64> = vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
//! forest.insert("A", &sig);
//! forest.build();
//!
//! assert_eq!(forest.query(&sig, None, None), vec!["A".to_string()]);
//!
//! // Pick K and L for a 1000-value domain, 200-value query, containment 0.6.
//! let params = forest.optimal_params(1000, 200, 0.6);
//! let candidates = forest.query(&sig, Some(params.k), Some(params.l));
//! assert!(candidates.contains(&"A".to_string()));
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `hash_key` | Band values → prefix-comparable byte keys |
//! | `forest` | Staging/band tables, insert, build, query |
//! | `probability` | False positive / negative models |
//! | `optimizer` | (K, L) grid search |
//! | `shared` | RwLock-guarded forest handle |
//! | `ensemble` | Size-partitioned forests |
//! | `config` | figment-based configuration |
//! | `logging` | Opt-in tracing subscriber |

pub mod config;
pub mod ensemble;
pub mod error;
pub mod forest;
pub mod hash_key;
pub mod logging;
pub mod optimizer;
pub mod probability;
pub mod shared;

pub use config::{Config, EnsembleConfig, ForestConfig, LoggingConfig};
pub use ensemble::{equi_depth_partitions, DomainRecord, LshEnsemble, Partition};
pub use error::{LshError, Result};
pub use forest::{BandTable, Bucket, ForestStats, LshForest};
pub use hash_key::{HashKey, HashValueSize};
pub use optimizer::{optimal_params, OptimalParams};
pub use probability::{ContainmentModel, ProbabilityModel, INTEGRATION_PRECISION};
pub use shared::SharedForest;
