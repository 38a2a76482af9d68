use std::path::Path;

use pf_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Settings for one processing run.
///
/// Every field has a default, so a config file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternFitConfig {
    /// Mean area (PE) of one detected photon.
    pub mean_pe_per_photon: f64,
    /// S1s at or below this area (PE) are not fitted.
    pub s1_min_reconstruction_area: f64,
    /// S2s at or below this area (PE) are not fitted.
    pub s2_min_reconstruction_area: f64,
    /// Positions with `sqrt(x^2 + y^2)` above this are not fitted.
    pub max_r: f64,
    /// Number of top-array channels; channel `i < n_top_channels` is top.
    pub n_top_channels: usize,
    /// Also return per-channel patterns and statistics.
    pub store_per_channel: bool,
    /// Also compute the alternate-S1 fraction-top probabilities.
    pub compute_alternates: bool,
}

impl Default for PatternFitConfig {
    fn default() -> Self {
        Self {
            mean_pe_per_photon: 1.2,
            s1_min_reconstruction_area: 0.0,
            s2_min_reconstruction_area: 10.0,
            max_r: 66.4,
            n_top_channels: 253,
            store_per_channel: false,
            compute_alternates: true,
        }
    }
}

impl PatternFitConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject values no run can use.
    pub fn validate(&self) -> Result<()> {
        if !self.mean_pe_per_photon.is_finite() || self.mean_pe_per_photon <= 0.0 {
            return Err(Error::Validation(format!(
                "mean_pe_per_photon must be finite and > 0, got {}",
                self.mean_pe_per_photon
            )));
        }
        for (name, value) in [
            ("s1_min_reconstruction_area", self.s1_min_reconstruction_area),
            ("s2_min_reconstruction_area", self.s2_min_reconstruction_area),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(Error::Validation(format!("{} must be >= 0, got {}", name, value)));
            }
        }
        if self.max_r.is_nan() || self.max_r <= 0.0 {
            return Err(Error::Validation(format!("max_r must be > 0, got {}", self.max_r)));
        }
        Ok(())
    }
}
