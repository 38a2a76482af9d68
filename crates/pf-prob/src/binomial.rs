//! Binomial distribution on a continuous count axis.
//!
//! Areas are continuous proxies for photon counts, so `k` and `n` are real
//! numbers throughout: the point probability is continued through `ln Γ` and
//! the tails through the regularized incomplete beta function
//! `I_x(a, b)`. For integer arguments every function agrees with the
//! ordinary binomial distribution.
//!
//! The two-sided test locates the mirror point `j` on the other side of the
//! mode whose point probability matches `k`'s, then sums the two tails
//! outward from `k` and `j`. `j` is found by an iterative grid search rather
//! than a closed form.

use crate::math::{linspace, ln_abs_gamma, xlogy};
use pf_core::{Error, Result};
use statrs::function::beta::checked_beta_reg;
use statrs::function::gamma::ln_gamma;

/// Relative inflation of the target density when searching for the mirror.
pub const MIRROR_RTOL: f64 = 1e-7;

/// Minimum number of grid samples per bracket refinement.
pub const MIN_BRACKET_SAMPLES: usize = 50;

// Below this `p`, `1 - (1-p)^n` goes through expm1/log1p.
const SMALL_P: f64 = 0.01;

#[inline]
fn regularized_beta(a: f64, b: f64, x: f64) -> f64 {
    checked_beta_reg(a, b, x).unwrap_or(f64::NAN)
}

/// Log point probability `ln P(X = k)` for `X ~ Binom(n, p)`.
///
/// Not validated: `k` outside `[0, n]` evaluates the analytic continuation
/// (`-inf` at the poles of `Γ(n-k+1)` / `Γ(k+1)`).
pub fn ln_pmf(k: f64, n: f64, p: f64) -> f64 {
    let ln_choose = ln_gamma(n + 1.0) - ln_abs_gamma(n - k + 1.0) - ln_abs_gamma(k + 1.0);
    ln_choose + xlogy(k, p) + xlogy(n - k, 1.0 - p)
}

/// Point probability `P(X = k)`. See [`ln_pmf`].
pub fn pmf(k: f64, n: f64, p: f64) -> f64 {
    ln_pmf(k, n, p).exp()
}

/// Lower tail `P(X <= k)`.
///
/// NaN for `k < 0`; `1` for `k >= n`.
pub fn cdf(k: f64, n: f64, p: f64) -> f64 {
    if k < 0.0 {
        return f64::NAN;
    }
    if k >= n {
        return 1.0;
    }
    let dn = n - k;
    if k == 0.0 {
        return (dn * (1.0 - p).ln()).exp();
    }
    regularized_beta(dn, k + 1.0, 1.0 - p)
}

/// Strict upper tail `P(X > k)`.
///
/// `1` for `k < 0`; `0` for `k >= n`.
pub fn sf(k: f64, n: f64, p: f64) -> f64 {
    if k < 0.0 {
        return 1.0;
    }
    if k >= n {
        return 0.0;
    }
    let dn = n - k;
    if k == 0.0 {
        // 1 - (1-p)^n cancels badly for small p.
        if p < SMALL_P {
            return -(dn * (-p).ln_1p()).exp_m1();
        }
        return 1.0 - (dn * (1.0 - p).ln()).exp();
    }
    regularized_beta(k + 1.0, dn, p)
}

/// Inclusive upper tail `P(X >= k)`, the mirror image of [`cdf`]:
/// `upper_tail(k, n, p) == cdf(n - k, n, 1 - p)`.
pub fn upper_tail(k: f64, n: f64, p: f64) -> f64 {
    if k <= 0.0 {
        return 1.0;
    }
    if k > n {
        return 0.0;
    }
    if k == n {
        return (n * p.ln()).exp();
    }
    regularized_beta(k, n - k + 1.0, p)
}

/// Reject parameter sets the binomial test is not defined for.
pub fn validate(k: f64, n: f64, p: f64) -> Result<()> {
    if !(k.is_finite() && n.is_finite() && p.is_finite()) {
        return Err(Error::Validation(format!(
            "k, n and p must be finite, got k={} n={} p={}",
            k, n, p
        )));
    }
    if n < k {
        return Err(Error::Validation(format!("n {} must be >= k {}", n, k)));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::Validation(format!("p {} must be in range [0, 1]", p)));
    }
    if k < 0.0 {
        return Err(Error::Validation(format!("k {} must be >= 0", k)));
    }
    Ok(())
}

/// Which way the density crosses the target inside the search bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchSide {
    /// `k` is below the mean; the mirror is in `(k, n]` where the density falls through the target.
    Upper,
    /// `k` is at or above the mean; the mirror is in `[0, k)` where the density rises through the target.
    Lower,
}

impl SearchSide {
    #[inline]
    fn straddles(self, d: f64, y0: f64, y1: f64) -> bool {
        match self {
            SearchSide::Upper => d > y1 && d <= y0,
            SearchSide::Lower => d >= y0 && d < y1,
        }
    }
}

/// Whether the density drops below `d` somewhere past a support edge.
///
/// Probes `edge + step * m` for `m = 0, 1, ...` while `m < n`.
fn mirror_past_edge(edge: f64, step: f64, n: f64, p: f64, d: f64) -> bool {
    let mut m = 0.0;
    while m < n {
        if pmf(edge + step * m, n, p) < d {
            return true;
        }
        m += 1.0;
    }
    false
}

/// Sum of the tails outward from `k` and `j`.
///
/// A tail that starts on the edge of the support (`0` for the lower tail,
/// `n` for the upper one) is empty.
fn outer_tails(k: f64, j: f64, n: f64, p: f64) -> f64 {
    let (lo, hi) = if k <= j { (k, j) } else { (j, k) };
    let lower = if lo > 0.0 { cdf(lo, n, p) } else { 0.0 };
    let upper = if hi < n { upper_tail(hi, n, p) } else { 0.0 };
    (lower + upper).min(1.0)
}

/// Exact two-sided binomial test of `k` successes in `n` trials against `p`.
///
/// Returns `Err(Error::Validation)` for `k > n`, `p` outside `[0, 1]`,
/// `k < 0` or non-finite inputs.
///
/// Degenerate outcomes are defined, not errors:
/// - the density at `k` underflows to zero: `0.0`
/// - the density never drops below the target past the support edge
///   (no mirror bracket): `0.0`
/// - `k` sits at the mode (no grid point denser than `k`): `j = k`, so the
///   two tails cover the whole support and the result is `1.0`
pub fn exact_test(k: f64, n: f64, p: f64) -> Result<f64> {
    validate(k, n, p)?;
    if n == 0.0 {
        return Ok(1.0);
    }

    let d = pmf(k, n, p) * (1.0 + MIRROR_RTOL);
    if d == 0.0 {
        return Ok(0.0);
    }

    let (mut j_min, mut j_max, side) = if k < n * p {
        if pmf(n, n, p) > d {
            // Nothing in [k, n] is as unlikely as k: the mirror is past n.
            return Ok(if mirror_past_edge(n, 1.0, n, p, d) { outer_tails(k, n, n, p) } else { 0.0 });
        }
        (k, n, SearchSide::Upper)
    } else {
        if pmf(0.0, n, p) > d {
            return Ok(if mirror_past_edge(0.0, -1.0, n, p, d) { outer_tails(k, 0.0, n, p) } else { 0.0 });
        }
        (0.0, k, SearchSide::Lower)
    };

    let n_iter = (n.log10().round() + 1.0).max(2.0) as usize;
    let mut refined = false;
    for _ in 0..n_iter {
        let n_pts = ((j_max - j_min) as usize).max(MIN_BRACKET_SAMPLES);
        let grid = linspace(j_min, j_max, n_pts);
        let density: Vec<f64> = grid.iter().map(|&x| pmf(x, n, p)).collect();
        match density.windows(2).position(|w| side.straddles(d, w[0], w[1])) {
            Some(i) => {
                j_min = grid[i];
                j_max = grid[i + 1];
                refined = true;
            }
            None => break,
        }
    }

    let j = if refined { (0.5 * (j_min + j_max)).clamp(0.0, n) } else { k };
    Ok(outer_tails(k, j, n, p))
}

/// Batch-facing [`exact_test`]: invalid parameters log a warning and yield NaN.
///
/// Non-finite inputs (missing reconstructions) yield NaN silently.
pub fn two_sided_test(k: f64, n: f64, p: f64) -> f64 {
    if !(k.is_finite() && n.is_finite() && p.is_finite()) {
        return f64::NAN;
    }
    match exact_test(k, n, p) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("binomial test skipped: {}", e);
            f64::NAN
        }
    }
}

/// Batch-facing validated [`pmf`] (the "discrete" probability).
///
/// Same NaN policy as [`two_sided_test`].
pub fn point_probability(k: f64, n: f64, p: f64) -> f64 {
    if !(k.is_finite() && n.is_finite() && p.is_finite()) {
        return f64::NAN;
    }
    match validate(k, n, p) {
        Ok(()) => pmf(k, n, p),
        Err(e) => {
            log::warn!("binomial point probability skipped: {}", e);
            f64::NAN
        }
    }
}
