//! Small numerically-stable math utilities used across probability code.

use statrs::function::gamma::ln_gamma;

/// `ln |Γ(x)|` for any real `x`.
///
/// Non-positive integers are poles and return `+inf`. Negative non-integers
/// use the reflection formula `Γ(x) Γ(1-x) = π / sin(πx)`.
pub fn ln_abs_gamma(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x > 0.0 {
        return ln_gamma(x);
    }
    if x == x.floor() {
        return f64::INFINITY;
    }
    // x < 0 here, so 1 - x > 1.
    std::f64::consts::PI.ln() - (std::f64::consts::PI * x).sin().abs().ln() - ln_gamma(1.0 - x)
}

/// `x * ln(y)` with the convention `0 * ln(0) = 0`.
#[inline]
pub fn xlogy(x: f64, y: f64) -> f64 {
    if x == 0.0 && !y.is_nan() { 0.0 } else { x * y.ln() }
}

/// `n` evenly spaced samples over `[start, stop]`, both ends included.
///
/// The last sample is exactly `stop`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / ((n - 1) as f64);
            let mut out: Vec<f64> = (0..n).map(|i| start + step * (i as f64)).collect();
            out[n - 1] = stop;
            out
        }
    }
}
