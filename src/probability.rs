//! False positive / false negative models used to tune K and L.
//!
//! For containment search with indexed domain size `x`, query domain size
//! `q` and containment `t`, the equivalent Jaccard similarity is
//!
//! ```text
//! s(t) = t / (1 + x/q - t)
//! ```
//!
//! and the chance that a banded LSH with `l` bands of `k` rows returns a
//! domain is `P(t) = 1 - (1 - s(t)^k)^l`. Below the threshold every
//! return is a false positive, above it every miss is a false negative:
//!
//! ```text
//! FP = ∫₀ᵗ P(u) du        FN = ∫ₜ¹ 1 - P(u) du
//! ```

/// Step size of the midpoint-rule integration.
pub const INTEGRATION_PRECISION: f64 = 0.01;

/// Error model consulted by the parameter optimizer.
///
/// Implementations must be pure functions of their inputs returning
/// probabilities in `[0, 1]`.
pub trait ProbabilityModel: Send + Sync {
    /// Probability of returning a domain whose containment is below `t`.
    fn false_positive(&self, x: usize, q: usize, l: usize, k: usize, t: f64, precision: f64)
        -> f64;

    /// Probability of missing a domain whose containment is at least `t`.
    fn false_negative(&self, x: usize, q: usize, l: usize, k: usize, t: f64, precision: f64)
        -> f64;
}

/// Containment model from LSH Ensemble.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContainmentModel;

impl ContainmentModel {
    /// Probability that a domain with containment `t` collides in at least
    /// one of `l` bands.
    ///
    /// When `x < q` a containment above `x / q` is unreachable and its
    /// Jaccard value is clamped to 1. The integrals still span `[0, 1]`, so
    /// the false negative mass includes that unreachable range.
    pub fn collision_probability(x: usize, q: usize, l: usize, k: usize, t: f64) -> f64 {
        let ratio = x as f64 / q as f64;
        let jaccard = (t / (1.0 + ratio - t)).clamp(0.0, 1.0);
        1.0 - (1.0 - jaccard.powi(k as i32)).powi(l as i32)
    }
}

impl ProbabilityModel for ContainmentModel {
    fn false_positive(
        &self,
        x: usize,
        q: usize,
        l: usize,
        k: usize,
        t: f64,
        precision: f64,
    ) -> f64 {
        integrate(|u| Self::collision_probability(x, q, l, k, u), 0.0, t, precision)
    }

    fn false_negative(
        &self,
        x: usize,
        q: usize,
        l: usize,
        k: usize,
        t: f64,
        precision: f64,
    ) -> f64 {
        integrate(
            |u| 1.0 - Self::collision_probability(x, q, l, k, u),
            t,
            1.0,
            precision,
        )
    }
}

/// Midpoint-rule integral of `f` over `[a, b]` with step `precision`.
///
/// The last step may reach past `b`; callers integrate over `[0, 1]`
/// where the integrands are defined anyway.
pub fn integrate(f: impl Fn(f64) -> f64, a: f64, b: f64, precision: f64) -> f64 {
    assert!(precision > 0.0, "integration precision must be > 0");
    if b <= a {
        return 0.0;
    }
    // Tolerate float error so (b - a) / precision = 50.000000001 is 50 steps.
    let steps = ((b - a) / precision - 1e-9).ceil() as usize;
    (0..steps)
        .map(|i| f(a + (i as f64 + 0.5) * precision) * precision)
        .sum()
}
