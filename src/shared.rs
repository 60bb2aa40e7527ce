//! Thread-safe handle over an [`LshForest`].
//!
//! Uses `parking_lot::RwLock` (no poisoning): `insert` and `build` take the
//! write lock, queries take the read lock and run side by side.

use crate::forest::{ForestStats, LshForest};
use crate::optimizer::OptimalParams;
use crossbeam_channel as channel;
use parking_lot::RwLock;
use std::sync::Arc;

/// Cloneable, lock-guarded forest shared between threads.
#[derive(Clone, Debug)]
pub struct SharedForest {
    inner: Arc<RwLock<LshForest>>,
}

impl SharedForest {
    pub fn new(forest: LshForest) -> Self {
        Self {
            inner: Arc::new(RwLock::new(forest)),
        }
    }

    pub fn insert(&self, item_key: &str, signature: &[u64]) {
        self.inner.write().insert(item_key, signature);
    }

    /// Stage many items under a single write lock.
    pub fn insert_batch<'a, I>(&self, items: I)
    where
        I: IntoIterator<Item = (&'a str, &'a [u64])>,
    {
        let mut forest = self.inner.write();
        for (key, signature) in items {
            forest.insert(key, signature);
        }
    }

    pub fn build(&self) {
        self.inner.write().build();
    }

    pub fn query(&self, signature: &[u64], k: Option<usize>, l: Option<usize>) -> Vec<String> {
        self.inner.read().query(signature, k, l)
    }

    pub fn query_into(
        &self,
        signature: &[u64],
        k: Option<usize>,
        l: Option<usize>,
        out: &channel::Sender<String>,
    ) {
        self.inner.read().query_into(signature, k, l, out);
    }

    pub fn stats(&self) -> ForestStats {
        self.inner.read().stats()
    }

    pub fn optimal_params(&self, x: usize, q: usize, t: f64) -> OptimalParams {
        self.inner.read().optimal_params(x, q, t)
    }

    /// Recover the forest if this is the last handle.
    pub fn into_inner(self) -> Option<LshForest> {
        Arc::try_unwrap(self.inner).ok().map(RwLock::into_inner)
    }
}

impl From<LshForest> for SharedForest {
    fn from(forest: LshForest) -> Self {
        Self::new(forest)
    }
}
