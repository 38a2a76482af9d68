//! Traits for the collaborators that feed the pattern-fit engine.
//!
//! Optical maps are built and loaded outside this workspace. The engine only
//! needs to evaluate them at a position, so they enter through these traits.
//! Implementations must be `Send + Sync`: one map instance is shared by every
//! worker of a batch for the whole run.

/// Position -> per-channel relative detection efficiency.
///
/// S1 maps are evaluated at `(x, y, z)` and return one value per channel.
/// S2 maps are evaluated at `(x, y)` and return at least one value per top
/// channel. Positions outside the map domain yield NaN entries, never a panic.
pub trait EfficiencyMap: Send + Sync {
    /// Evaluate the map at `position`.
    fn efficiencies(&self, position: &[f64]) -> Vec<f64>;
}

/// Position -> scalar probability (e.g. the S1 area-fraction-top map).
///
/// Out-of-domain positions yield NaN.
pub trait ProbabilityMap: Send + Sync {
    /// Evaluate the map at `position`.
    fn probability(&self, position: &[f64]) -> f64;
}

impl<F> EfficiencyMap for F
where
    F: Fn(&[f64]) -> Vec<f64> + Send + Sync,
{
    fn efficiencies(&self, position: &[f64]) -> Vec<f64> {
        self(position)
    }
}

impl<F> ProbabilityMap for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn probability(&self, position: &[f64]) -> f64 {
        self(position)
    }
}
