//! Modified ("shifted") Poisson `-2 ln L` for area patterns.
//!
//! A channel records an area, not a count. Dividing by the mean area per
//! detected quantum gives a non-integer pseudo-count `q`, and the Poisson
//! likelihood is continued to real `q` through `ln Γ(q + 1)`. The
//! `ln(mean_area_per_quantum)` term is the Jacobian of the area -> count
//! change of variables.

use pf_core::{Error, Result};
use statrs::function::gamma::ln_gamma;

/// `-2 ln L` of one channel observing `area` against an expectation of `mu`
/// quanta.
///
/// Overrides, in order:
/// 1. `area <= 0` (or NaN): `2 * mu`, the cost of observing nothing.
/// 2. additionally `mu < 0`: `0`.
///
/// Otherwise `2 * (mu - q ln(mu) + ln Γ(q + 1) + ln(mean_area_per_quantum))`
/// with `q = area / mean_area_per_quantum`; `mu <= 0` there follows IEEE
/// semantics (`+inf` / NaN) and is not overridden.
#[inline]
pub fn neg2llh(mu: f64, area: f64, mean_area_per_quantum: f64) -> f64 {
    if !(area > 0.0) {
        return if mu < 0.0 { 0.0 } else { 2.0 * mu };
    }
    let q = area / mean_area_per_quantum;
    2.0 * (mu - q * mu.ln() + ln_gamma(q + 1.0) + mean_area_per_quantum.ln())
}

fn check_inputs(mu_len: usize, areas_len: usize, mean_area_per_quantum: f64) -> Result<()> {
    if mu_len != areas_len {
        return Err(Error::Validation(format!(
            "expectation/observation length mismatch: {} vs {}",
            mu_len, areas_len
        )));
    }
    if !mean_area_per_quantum.is_finite() || mean_area_per_quantum <= 0.0 {
        return Err(Error::Validation(format!(
            "mean_area_per_quantum must be finite and > 0, got {}",
            mean_area_per_quantum
        )));
    }
    Ok(())
}

/// Element-wise [`neg2llh`].
pub fn neg2llh_modpoisson(mu: &[f64], areas: &[f64], mean_area_per_quantum: f64) -> Result<Vec<f64>> {
    check_inputs(mu.len(), areas.len(), mean_area_per_quantum)?;
    Ok(mu.iter().zip(areas).map(|(&m, &a)| neg2llh(m, a, mean_area_per_quantum)).collect())
}

/// Per-channel likelihood ratio of an expected area pattern against the
/// saturated model (the observation as its own expectation).
///
/// Both `expected_area` and `areas` are in area units; each is divided by
/// `mean_area_per_quantum` to get the expectation in quanta. The result is
/// exactly zero on channels where the two patterns agree.
pub fn likelihood_ratio_per_channel(
    expected_area: &[f64],
    areas: &[f64],
    mean_area_per_quantum: f64,
) -> Result<Vec<f64>> {
    check_inputs(expected_area.len(), areas.len(), mean_area_per_quantum)?;
    Ok(expected_area
        .iter()
        .zip(areas)
        .map(|(&e, &a)| {
            let model = neg2llh(e / mean_area_per_quantum, a, mean_area_per_quantum);
            let saturated = neg2llh(a / mean_area_per_quantum, a, mean_area_per_quantum);
            model - saturated
        })
        .collect())
}

/// Sum of [`likelihood_ratio_per_channel`]; any NaN channel makes the sum NaN.
pub fn likelihood_ratio(expected_area: &[f64], areas: &[f64], mean_area_per_quantum: f64) -> Result<f64> {
    Ok(likelihood_ratio_per_channel(expected_area, areas, mean_area_per_quantum)?.iter().sum())
}
