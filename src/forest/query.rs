//! Query engine: parallel per-band prefix search with streaming dedup.
//!
//! One rayon task per searched band walks its prefix range and pushes
//! borrowed item keys into a channel. The querying thread (a worker of the
//! forest's own pool when it has one) drains the channel, keeping the first occurrence of each key; the channel closes
//! once the last producer has dropped its sender.

use super::{in_pool, LshForest};
use crate::hash_key::HashKey;
use crossbeam_channel as channel;
use std::collections::HashSet;

impl LshForest {
    /// Candidate item keys for `signature`, each reported once.
    ///
    /// `k` and `l` choose how many leading values of each band window and
    /// how many leading bands take part; `None` uses the configured
    /// `max_k` / `max_l`. Band windows always start at multiples of
    /// `max_k`. Order of the result is unspecified.
    ///
    /// # Panics
    ///
    /// Panics if `k` is outside `[1, max_k]`, `l` is outside `[1, max_l]`,
    /// or `signature` holds fewer than `max_k * max_l` values.
    pub fn query(&self, signature: &[u64], k: Option<usize>, l: Option<usize>) -> Vec<String> {
        let mut found = Vec::new();
        self.search(signature, k, l, |item| found.push(item.to_string()));
        found
    }

    /// Streaming form of [`query`](Self::query): each distinct candidate is
    /// sent to `out` as soon as the first band reports it.
    pub fn query_into(
        &self,
        signature: &[u64],
        k: Option<usize>,
        l: Option<usize>,
        out: &channel::Sender<String>,
    ) {
        self.search(signature, k, l, |item| {
            // A dropped receiver just means nobody is listening any more.
            let _ = out.send(item.to_string());
        });
    }

    fn search(
        &self,
        signature: &[u64],
        k: Option<usize>,
        l: Option<usize>,
        emit: impl FnMut(&str) + Send,
    ) {
        let (k, l) = self.resolve_shape(k, l);
        self.check_signature(signature);

        let query_keys: Vec<HashKey> = (0..l)
            .map(|i| {
                let start = i * self.max_k;
                self.hash_value_size.encode(&signature[start..start + k])
            })
            .collect();

        let bands = &self.bands[..l];
        let (tx, rx) = channel::unbounded::<&str>();

        let candidates = in_pool(self.pool.as_ref(), move || {
            rayon::in_place_scope(|s| {
                for (band, key) in bands.iter().zip(&query_keys) {
                    let tx = tx.clone();
                    s.spawn(move |_| {
                        for bucket in band.prefix_range(key) {
                            for item in &bucket.items {
                                // The consumer only exits after every sender is gone.
                                let _ = tx.send(item.as_str());
                            }
                        }
                    });
                }
                drop(tx);
                drain_unique(&rx, emit)
            })
        });

        tracing::trace!(k, l, candidates, "forest_query");
    }

    fn resolve_shape(&self, k: Option<usize>, l: Option<usize>) -> (usize, usize) {
        let k = k.unwrap_or(self.max_k);
        let l = l.unwrap_or(self.max_l);
        assert!(
            (1..=self.max_k).contains(&k),
            "query k must be in [1, {}], got {k}",
            self.max_k
        );
        assert!(
            (1..=self.max_l).contains(&l),
            "query l must be in [1, {}], got {l}",
            self.max_l
        );
        (k, l)
    }
}

/// Emit the first occurrence of every key until all senders are dropped.
///
/// On a rayon worker the consumer helps run pending producers instead of
/// blocking, so a query issued from inside a pool never stalls on its own
/// band jobs. Returns the number of distinct keys seen.
fn drain_unique<'a>(rx: &channel::Receiver<&'a str>, mut emit: impl FnMut(&'a str)) -> usize {
    let mut seen: HashSet<&str> = HashSet::new();
    loop {
        let item = match rx.try_recv() {
            Ok(item) => item,
            Err(channel::TryRecvError::Disconnected) => break,
            Err(channel::TryRecvError::Empty) => match rayon::yield_now() {
                None => match rx.recv() {
                    Ok(item) => item,
                    Err(_) => break,
                },
                Some(rayon::Yield::Executed) => continue,
                Some(rayon::Yield::Idle) => {
                    std::thread::yield_now();
                    continue;
                }
            },
        };
        if seen.insert(item) {
            emit(item);
        }
    }
    seen.len()
}
