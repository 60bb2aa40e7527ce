//! Grid search for the (K, L) pair with the lowest combined error.

use crate::forest::LshForest;
use crate::probability::{ContainmentModel, ProbabilityModel, INTEGRATION_PRECISION};

/// Winning banding parameters and their error probabilities
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OptimalParams {
    /// Hash values per band
    pub k: usize,
    /// Number of bands
    pub l: usize,
    pub false_positive: f64,
    pub false_negative: f64,
}

impl OptimalParams {
    pub fn total_error(&self) -> f64 {
        self.false_positive + self.false_negative
    }
}

/// Scan every `1 <= k <= max_k`, `1 <= l <= max_l` and return the pair
/// minimizing `fp + fn` for indexed size `x`, query size `q` and
/// threshold `t`.
///
/// `l` is the outer loop and `k` the inner one, both ascending; on an exact
/// tie the first pair scanned wins.
///
/// # Panics
///
/// Panics if `x`, `q`, `max_k` or `max_l` is zero, or `t` is outside `[0, 1]`.
pub fn optimal_params(
    max_k: usize,
    max_l: usize,
    x: usize,
    q: usize,
    t: f64,
    model: &dyn ProbabilityModel,
) -> OptimalParams {
    assert!(x > 0, "indexed domain size must be > 0");
    assert!(q > 0, "query domain size must be > 0");
    assert!(max_k > 0 && max_l > 0, "max_k and max_l must be > 0");
    assert!((0.0..=1.0).contains(&t), "threshold must be in [0, 1], got {t}");

    let mut best = OptimalParams {
        k: 1,
        l: 1,
        false_positive: 0.0,
        false_negative: 0.0,
    };
    let mut min_error = f64::MAX;
    for l in 1..=max_l {
        for k in 1..=max_k {
            let fp = model.false_positive(x, q, l, k, t, INTEGRATION_PRECISION);
            let fn_ = model.false_negative(x, q, l, k, t, INTEGRATION_PRECISION);
            if fp + fn_ < min_error {
                min_error = fp + fn_;
                best = OptimalParams {
                    k,
                    l,
                    false_positive: fp,
                    false_negative: fn_,
                };
            }
        }
    }

    tracing::trace!(x, q, t, k = best.k, l = best.l, error = min_error, "optimal_params");
    best
}

impl LshForest {
    /// Best (K, L) within this forest's shape under [`ContainmentModel`].
    pub fn optimal_params(&self, x: usize, q: usize, t: f64) -> OptimalParams {
        self.optimal_params_with(x, q, t, &ContainmentModel)
    }

    /// Best (K, L) within this forest's shape under a caller-supplied model.
    pub fn optimal_params_with(
        &self,
        x: usize,
        q: usize,
        t: f64,
        model: &dyn ProbabilityModel,
    ) -> OptimalParams {
        optimal_params(self.max_k(), self.max_l(), x, q, t, model)
    }
}
