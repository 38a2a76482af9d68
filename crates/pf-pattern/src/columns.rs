use pf_core::EventScores;
use pf_core::types::ChannelDiagnostics;
use serde::Serialize;

/// Batch output as named columns, one row per input event.
///
/// NaN serializes to JSON `null`. The alternate-S1 columns are empty when
/// alternates are not computed; `channels` is empty unless per-channel
/// diagnostics are stored.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatternFitColumns {
    /// Event start times.
    pub time: Vec<i64>,
    /// Event end times.
    pub endtime: Vec<i64>,
    /// Main S1, all channels.
    pub s1_2llh: Vec<f64>,
    /// Main S1, top channels.
    pub s1_top_2llh: Vec<f64>,
    /// Main S1, bottom channels.
    pub s1_bottom_2llh: Vec<f64>,
    /// Main S2.
    pub s2_2llh: Vec<f64>,
    /// Alternate S2.
    pub alt_s2_2llh: Vec<f64>,
    /// Main S1 two-sided test on areas.
    pub s1_area_fraction_top_continuous_probability: Vec<f64>,
    /// Main S1 point probability on areas.
    pub s1_area_fraction_top_discrete_probability: Vec<f64>,
    /// Main S1 two-sided test on photons.
    pub s1_photon_fraction_top_continuous_probability: Vec<f64>,
    /// Main S1 point probability on photons.
    pub s1_photon_fraction_top_discrete_probability: Vec<f64>,
    /// Alternate S1 two-sided test on areas.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alt_s1_area_fraction_top_continuous_probability: Vec<f64>,
    /// Alternate S1 point probability on areas.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alt_s1_area_fraction_top_discrete_probability: Vec<f64>,
    /// Alternate S1 two-sided test on photons.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alt_s1_photon_fraction_top_continuous_probability: Vec<f64>,
    /// Alternate S1 point probability on photons.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alt_s1_photon_fraction_top_discrete_probability: Vec<f64>,
    /// Per-channel diagnostics, one entry per row.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<ChannelDiagnostics>,
}

impl PatternFitColumns {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Append one event's scores as a row.
    pub fn push(&mut self, scores: EventScores) {
        self.time.push(scores.time);
        self.endtime.push(scores.endtime);

        let l = scores.likelihood;
        self.s1_2llh.push(l.s1_2llh);
        self.s1_top_2llh.push(l.s1_top_2llh);
        self.s1_bottom_2llh.push(l.s1_bottom_2llh);
        self.s2_2llh.push(l.s2_2llh);
        self.alt_s2_2llh.push(l.alt_s2_2llh);

        let f = scores.s1_fraction;
        self.s1_area_fraction_top_continuous_probability.push(f.area_continuous);
        self.s1_area_fraction_top_discrete_probability.push(f.area_discrete);
        self.s1_photon_fraction_top_continuous_probability.push(f.photon_continuous);
        self.s1_photon_fraction_top_discrete_probability.push(f.photon_discrete);

        if let Some(f) = scores.alt_s1_fraction {
            self.alt_s1_area_fraction_top_continuous_probability.push(f.area_continuous);
            self.alt_s1_area_fraction_top_discrete_probability.push(f.area_discrete);
            self.alt_s1_photon_fraction_top_continuous_probability.push(f.photon_continuous);
            self.alt_s1_photon_fraction_top_discrete_probability.push(f.photon_discrete);
        }
        if let Some(c) = scores.channels {
            self.channels.push(c);
        }
    }
}

impl FromIterator<EventScores> for PatternFitColumns {
    fn from_iter<I: IntoIterator<Item = EventScores>>(iter: I) -> Self {
        let mut columns = Self::default();
        for scores in iter {
            columns.push(scores);
        }
        columns
    }
}
