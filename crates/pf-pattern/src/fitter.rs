use std::sync::Arc;

use pf_core::types::{ChannelDiagnostics, nan_as_null, nan_as_null_vec};
use pf_core::{EfficiencyMap, Error, Event, EventScores, LikelihoodScores, ProbabilityMap, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::columns::PatternFitColumns;
use crate::config::PatternFitConfig;
use crate::fraction::peak_fraction_probabilities;
use crate::likelihood::{SubsetFit, fit_s1, fit_s2, s1_eligible, s2_eligible};
use crate::mask::{ChannelMask, ChannelSubset};

/// Map values an event needs, evaluated at its reconstructed positions.
///
/// Efficiency vectors are empty for hypotheses that are not fitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLookups {
    /// S1 map at the main S1 position, one entry per channel.
    #[serde(default, with = "nan_as_null_vec")]
    pub s1_efficiency: Vec<f64>,
    /// S2 map at the main S2 position, one entry per top channel.
    #[serde(default, with = "nan_as_null_vec")]
    pub s2_efficiency: Vec<f64>,
    /// S2 map at the alternate S2 position.
    #[serde(default, with = "nan_as_null_vec")]
    pub alt_s2_efficiency: Vec<f64>,
    /// AFT map at the main S1 position.
    #[serde(default = "nan", with = "nan_as_null")]
    pub s1_aft_probability: f64,
    /// AFT map at the alternate S1 position.
    #[serde(default = "nan", with = "nan_as_null")]
    pub alt_s1_aft_probability: f64,
}

fn nan() -> f64 {
    f64::NAN
}

impl EventLookups {
    /// Evaluate the maps of `context` for `event`, skipping hypotheses that
    /// will not be fitted.
    pub fn evaluate(event: &Event, context: &PatternFitContext) -> Self {
        let config = &context.config;
        let efficiency = |eligible: bool, map: &dyn EfficiencyMap, position: &[f64]| {
            if eligible { map.efficiencies(position) } else { Vec::new() }
        };
        let aft = |present: bool, position: &[f64]| {
            if present && !position.is_empty() { context.aft_map.probability(position) } else { f64::NAN }
        };

        Self {
            s1_efficiency: efficiency(s1_eligible(&event.s1, config), context.s1_map.as_ref(), &event.s1.position),
            s2_efficiency: efficiency(s2_eligible(&event.s2, config), context.s2_map.as_ref(), &event.s2.position),
            alt_s2_efficiency: efficiency(
                s2_eligible(&event.alt_s2, config),
                context.s2_map.as_ref(),
                &event.alt_s2.position,
            ),
            s1_aft_probability: aft(event.s1.is_present(), &event.s1.position),
            alt_s1_aft_probability: if config.compute_alternates {
                aft(event.alt_s1.is_present(), &event.alt_s1.position)
            } else {
                f64::NAN
            },
        }
    }
}

/// Everything loaded once per run: config, channel mask and the optical maps.
///
/// Immutable after construction; share it by reference across workers.
#[derive(Clone)]
pub struct PatternFitContext {
    config: PatternFitConfig,
    mask: ChannelMask,
    s1_map: Arc<dyn EfficiencyMap>,
    s2_map: Arc<dyn EfficiencyMap>,
    aft_map: Arc<dyn ProbabilityMap>,
}

impl std::fmt::Debug for PatternFitContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternFitContext")
            .field("config", &self.config)
            .field("n_channels", &self.mask.len())
            .field("n_top", &self.mask.n_top())
            .finish_non_exhaustive()
    }
}

impl PatternFitContext {
    /// Validate and assemble a run context.
    pub fn new(
        config: PatternFitConfig,
        mask: ChannelMask,
        s1_map: Arc<dyn EfficiencyMap>,
        s2_map: Arc<dyn EfficiencyMap>,
        aft_map: Arc<dyn ProbabilityMap>,
    ) -> Result<Self> {
        config.validate()?;
        check_mask(&config, &mask)?;
        Ok(Self { config, mask, s1_map, s2_map, aft_map })
    }

    /// Run configuration.
    pub fn config(&self) -> &PatternFitConfig {
        &self.config
    }

    /// Usable-channel mask.
    pub fn mask(&self) -> &ChannelMask {
        &self.mask
    }

    /// Evaluate the maps for `event` and score it.
    pub fn score(&self, event: &Event) -> Result<EventScores> {
        let lookups = EventLookups::evaluate(event, self);
        score_event(event, &lookups, &self.config, &self.mask)
    }

    /// Score a batch in parallel on the global Rayon pool.
    ///
    /// Output rows follow input order. Per-event statistical failures are NaN
    /// in the output; only malformed input (wrong per-channel lengths) aborts
    /// the batch.
    pub fn score_batch(&self, events: &[Event]) -> Result<PatternFitColumns> {
        log::debug!("pattern fit: scoring {} events", events.len());
        let scores = events.par_iter().map(|event| self.score(event)).collect::<Result<Vec<_>>>()?;
        Ok(scores.into_iter().collect())
    }
}

fn check_mask(config: &PatternFitConfig, mask: &ChannelMask) -> Result<()> {
    if config.n_top_channels != mask.n_top() {
        return Err(Error::Validation(format!(
            "config n_top_channels ({}) does not match mask split ({})",
            config.n_top_channels,
            mask.n_top()
        )));
    }
    Ok(())
}

/// Score a batch whose map lookups were evaluated elsewhere.
///
/// `lookups[i]` belongs to `events[i]`.
pub fn score_batch_with_lookups(
    events: &[Event],
    lookups: &[EventLookups],
    config: &PatternFitConfig,
    mask: &ChannelMask,
) -> Result<PatternFitColumns> {
    if events.len() != lookups.len() {
        return Err(Error::Validation(format!(
            "events/lookups length mismatch: {} vs {}",
            events.len(),
            lookups.len()
        )));
    }
    config.validate()?;
    check_mask(config, mask)?;

    log::debug!("pattern fit: scoring {} events with supplied lookups", events.len());
    let scores = events
        .par_iter()
        .zip(lookups.par_iter())
        .map(|(event, lookups)| score_event(event, lookups, config, mask))
        .collect::<Result<Vec<_>>>()?;
    Ok(scores.into_iter().collect())
}

fn nan_diagnostics(mask: &ChannelMask) -> ChannelDiagnostics {
    let all = vec![f64::NAN; mask.len()];
    let top = vec![f64::NAN; mask.n_top()];
    ChannelDiagnostics {
        s1_pattern: all.clone(),
        s1_2llh_per_channel: all,
        s2_pattern: top.clone(),
        s2_2llh_per_channel: top.clone(),
        alt_s2_pattern: top.clone(),
        alt_s2_2llh_per_channel: top,
    }
}

fn scatter_fit(mask: &ChannelMask, fit: &SubsetFit, subset: ChannelSubset) -> Result<(Vec<f64>, Vec<f64>)> {
    Ok((mask.scatter(&fit.pattern, subset, 0.0)?, mask.scatter(&fit.per_channel, subset, 0.0)?))
}

/// Score one event from its map lookups.
///
/// Ineligible hypotheses are NaN. Per-channel diagnostics (when enabled) are
/// full length with `0.0` on dead channels.
pub fn score_event(
    event: &Event,
    lookups: &EventLookups,
    config: &PatternFitConfig,
    mask: &ChannelMask,
) -> Result<EventScores> {
    let maq = config.mean_pe_per_photon;
    let mut likelihood = LikelihoodScores::nan();
    let mut channels = config.store_per_channel.then(|| nan_diagnostics(mask));

    if s1_eligible(&event.s1, config) {
        let fit = fit_s1(&event.s1, &lookups.s1_efficiency, mask, maq)?;
        likelihood.s1_2llh = fit.all.statistic;
        likelihood.s1_top_2llh = fit.top.statistic;
        likelihood.s1_bottom_2llh = fit.bottom.statistic;
        if let Some(diag) = channels.as_mut() {
            (diag.s1_pattern, diag.s1_2llh_per_channel) = scatter_fit(mask, &fit.all, ChannelSubset::All)?;
        }
    }

    if s2_eligible(&event.s2, config) {
        let fit = fit_s2(&event.s2, &lookups.s2_efficiency, mask, maq)?;
        likelihood.s2_2llh = fit.statistic;
        if let Some(diag) = channels.as_mut() {
            (diag.s2_pattern, diag.s2_2llh_per_channel) = scatter_fit(mask, &fit, ChannelSubset::Top)?;
        }
    }

    if s2_eligible(&event.alt_s2, config) {
        let fit = fit_s2(&event.alt_s2, &lookups.alt_s2_efficiency, mask, maq)?;
        likelihood.alt_s2_2llh = fit.statistic;
        if let Some(diag) = channels.as_mut() {
            (diag.alt_s2_pattern, diag.alt_s2_2llh_per_channel) = scatter_fit(mask, &fit, ChannelSubset::Top)?;
        }
    }

    let s1_fraction = peak_fraction_probabilities(&event.s1, lookups.s1_aft_probability, maq);
    let alt_s1_fraction = config
        .compute_alternates
        .then(|| peak_fraction_probabilities(&event.alt_s1, lookups.alt_s1_aft_probability, maq));

    Ok(EventScores {
        time: event.time,
        endtime: event.endtime,
        likelihood,
        s1_fraction,
        alt_s1_fraction,
        channels,
    })
}
