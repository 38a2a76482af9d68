//! Common data types for PatternFit

use serde::{Deserialize, Serialize};

/// Serde adapter mapping NaN <-> JSON `null`.
///
/// Missing reconstructions are NaN in memory; JSON has no NaN literal.
pub mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize NaN as `null`, everything else as a number.
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() { serializer.serialize_none() } else { serializer.serialize_some(value) }
    }

    /// Deserialize `null` (or a number) into `f64`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

/// Element-wise [`nan_as_null`] for `Vec<f64>`.
pub mod nan_as_null_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize NaN entries as `null`.
    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| if v.is_nan() { None } else { Some(*v) }))
    }

    /// Deserialize `null` entries into NaN.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let raw = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

fn nan() -> f64 {
    f64::NAN
}

/// One reconstructed peak (S1 or S2 hypothesis) of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peak {
    /// Peak index inside the event; `None` when the hypothesis is missing.
    #[serde(default)]
    pub index: Option<i64>,

    /// Total area (PE).
    #[serde(default = "nan", with = "nan_as_null")]
    pub area: f64,

    /// Fraction of `area` seen by the top array.
    #[serde(default = "nan", with = "nan_as_null")]
    pub area_fraction_top: f64,

    /// Reconstructed position: `(x, y, z)` for S1, `(x, y)` for S2.
    #[serde(default, with = "nan_as_null_vec")]
    pub position: Vec<f64>,

    /// Observed area per channel, full channel length.
    #[serde(default, with = "nan_as_null_vec")]
    pub area_per_channel: Vec<f64>,
}

impl Peak {
    /// A peak that was not found in the event.
    pub fn missing() -> Self {
        Self {
            index: None,
            area: f64::NAN,
            area_fraction_top: f64::NAN,
            position: Vec::new(),
            area_per_channel: Vec::new(),
        }
    }

    /// Whether the hypothesis exists (index is valid).
    pub fn is_present(&self) -> bool {
        matches!(self.index, Some(i) if i >= 0)
    }

    /// Transverse radius `sqrt(x^2 + y^2)`; NaN without an `(x, y)` position.
    pub fn radius(&self) -> f64 {
        match self.position.as_slice() {
            [x, y, ..] => x.hypot(*y),
            _ => f64::NAN,
        }
    }

    /// Whether every position coordinate is finite (and there is at least one).
    pub fn has_finite_position(&self) -> bool {
        !self.position.is_empty() && self.position.iter().all(|v| v.is_finite())
    }
}

/// Per-event input: the S1/S2 hypotheses and their alternates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event start time (ns).
    #[serde(default)]
    pub time: i64,
    /// Event end time (ns).
    #[serde(default)]
    pub endtime: i64,
    /// Main S1.
    pub s1: Peak,
    /// Alternate S1.
    #[serde(default = "Peak::missing")]
    pub alt_s1: Peak,
    /// Main S2.
    pub s2: Peak,
    /// Alternate S2.
    #[serde(default = "Peak::missing")]
    pub alt_s2: Peak,
}

/// The five `-2 ln L` likelihood-ratio scalars of an event.
///
/// NaN marks a hypothesis that was not eligible for the pattern fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodScores {
    /// Main S1, all usable channels.
    #[serde(with = "nan_as_null")]
    pub s1_2llh: f64,
    /// Main S1, top usable channels.
    #[serde(with = "nan_as_null")]
    pub s1_top_2llh: f64,
    /// Main S1, bottom usable channels.
    #[serde(with = "nan_as_null")]
    pub s1_bottom_2llh: f64,
    /// Main S2, top usable channels.
    #[serde(with = "nan_as_null")]
    pub s2_2llh: f64,
    /// Alternate S2, top usable channels.
    #[serde(with = "nan_as_null")]
    pub alt_s2_2llh: f64,
}

impl LikelihoodScores {
    /// All scalars NaN.
    pub fn nan() -> Self {
        Self {
            s1_2llh: f64::NAN,
            s1_top_2llh: f64::NAN,
            s1_bottom_2llh: f64::NAN,
            s2_2llh: f64::NAN,
            alt_s2_2llh: f64::NAN,
        }
    }
}

/// Binomial consistency of an S1 top/bottom split with the AFT map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionProbabilities {
    /// Two-sided exact test on areas.
    #[serde(with = "nan_as_null")]
    pub area_continuous: f64,
    /// Point probability on areas.
    #[serde(with = "nan_as_null")]
    pub area_discrete: f64,
    /// Two-sided exact test on inferred photon counts.
    #[serde(with = "nan_as_null")]
    pub photon_continuous: f64,
    /// Point probability on inferred photon counts.
    #[serde(with = "nan_as_null")]
    pub photon_discrete: f64,
}

impl FractionProbabilities {
    /// All probabilities NaN.
    pub fn nan() -> Self {
        Self {
            area_continuous: f64::NAN,
            area_discrete: f64::NAN,
            photon_continuous: f64::NAN,
            photon_discrete: f64::NAN,
        }
    }
}

/// Per-channel expected pattern and statistic, full channel length.
///
/// Dead channels hold `0.0`. Ineligible hypotheses are NaN throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDiagnostics {
    /// Main S1 expected area per channel (all channels).
    #[serde(with = "nan_as_null_vec")]
    pub s1_pattern: Vec<f64>,
    /// Main S1 statistic per channel (all channels).
    #[serde(with = "nan_as_null_vec")]
    pub s1_2llh_per_channel: Vec<f64>,
    /// Main S2 expected area per top channel.
    #[serde(with = "nan_as_null_vec")]
    pub s2_pattern: Vec<f64>,
    /// Main S2 statistic per top channel.
    #[serde(with = "nan_as_null_vec")]
    pub s2_2llh_per_channel: Vec<f64>,
    /// Alternate S2 expected area per top channel.
    #[serde(with = "nan_as_null_vec")]
    pub alt_s2_pattern: Vec<f64>,
    /// Alternate S2 statistic per top channel.
    #[serde(with = "nan_as_null_vec")]
    pub alt_s2_2llh_per_channel: Vec<f64>,
}

/// Everything computed for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventScores {
    /// Passthrough of [`Event::time`].
    pub time: i64,
    /// Passthrough of [`Event::endtime`].
    pub endtime: i64,
    /// Pattern likelihood-ratio scalars.
    pub likelihood: LikelihoodScores,
    /// Main S1 fraction-top probabilities.
    pub s1_fraction: FractionProbabilities,
    /// Alternate S1 fraction-top probabilities (when alternates are computed).
    pub alt_s1_fraction: Option<FractionProbabilities>,
    /// Diagnostic per-channel vectors (when requested).
    pub channels: Option<ChannelDiagnostics>,
}
