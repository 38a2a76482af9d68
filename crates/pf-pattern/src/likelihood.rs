//! Pattern likelihood-ratio aggregation.
//!
//! Each hypothesis is scored by predicting the per-channel area from the
//! optical map and summing the modified-Poisson likelihood ratio of the
//! observation against that prediction over a channel subset.

use pf_core::{Error, Peak, Result};
use pf_prob::modpoisson::likelihood_ratio_per_channel;

use crate::config::PatternFitConfig;
use crate::mask::{ChannelMask, ChannelSubset};
use crate::predictor::predict_subset;

/// Expected pattern and per-channel statistic for one channel subset.
///
/// Both vectors are compact: one entry per usable channel of the subset.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetFit {
    /// Sum of `per_channel`.
    pub statistic: f64,
    /// Expected area per usable channel.
    pub pattern: Vec<f64>,
    /// Likelihood ratio per usable channel.
    pub per_channel: Vec<f64>,
}

/// Main-S1 fit on all, top and bottom channels.
#[derive(Debug, Clone, PartialEq)]
pub struct S1Fit {
    /// All usable channels, normalized to the full area.
    pub all: SubsetFit,
    /// Top usable channels, normalized to `aft * area`.
    pub top: SubsetFit,
    /// Bottom usable channels, normalized to `(1 - aft) * area`.
    pub bottom: SubsetFit,
}

fn position_in_volume(peak: &Peak, max_r: f64) -> bool {
    peak.has_finite_position() && peak.radius() <= max_r
}

/// Whether an S1 gets a pattern fit.
pub fn s1_eligible(peak: &Peak, config: &PatternFitConfig) -> bool {
    peak.is_present()
        && peak.area > config.s1_min_reconstruction_area
        && peak.area_fraction_top >= 0.0
        && position_in_volume(peak, config.max_r)
}

/// Whether an S2 (main or alternate) gets a pattern fit.
pub fn s2_eligible(peak: &Peak, config: &PatternFitConfig) -> bool {
    peak.is_present()
        && peak.area > config.s2_min_reconstruction_area
        && peak.area_fraction_top > 0.0
        && position_in_volume(peak, config.max_r)
}

/// Predict `total_area` over `subset` and compare against `observed`.
pub fn fit_subset(
    mask: &ChannelMask,
    efficiency: &[f64],
    observed: &[f64],
    total_area: f64,
    subset: ChannelSubset,
    mean_pe_per_photon: f64,
) -> Result<SubsetFit> {
    let pattern = predict_subset(mask, efficiency, total_area, subset)?;
    let areas = mask.select(observed, subset)?;
    let per_channel = likelihood_ratio_per_channel(&pattern, &areas, mean_pe_per_photon)?;
    Ok(SubsetFit {
        statistic: per_channel.iter().sum(),
        pattern,
        per_channel,
    })
}

/// Score a main S1 against its map efficiencies.
///
/// The caller checks [`s1_eligible`] first. `efficiency` and the peak's
/// `area_per_channel` must cover every channel of the mask.
pub fn fit_s1(peak: &Peak, efficiency: &[f64], mask: &ChannelMask, mean_pe_per_photon: f64) -> Result<S1Fit> {
    check_channels("S1 efficiency", efficiency.len(), mask.len())?;
    check_channels("S1 area_per_channel", peak.area_per_channel.len(), mask.len())?;

    let area = peak.area;
    let aft = peak.area_fraction_top;
    let observed = &peak.area_per_channel;
    Ok(S1Fit {
        all: fit_subset(mask, efficiency, observed, area, ChannelSubset::All, mean_pe_per_photon)?,
        top: fit_subset(mask, efficiency, observed, aft * area, ChannelSubset::Top, mean_pe_per_photon)?,
        bottom: fit_subset(mask, efficiency, observed, (1.0 - aft) * area, ChannelSubset::Bottom, mean_pe_per_photon)?,
    })
}

/// Score an S2 (main or alternate) against its map efficiencies, on the top
/// array only.
///
/// The S2 light on the top array is normalized to the peak's own
/// `aft * area`.
pub fn fit_s2(peak: &Peak, efficiency: &[f64], mask: &ChannelMask, mean_pe_per_photon: f64) -> Result<SubsetFit> {
    check_channels("S2 efficiency", efficiency.len(), mask.n_top())?;
    check_channels("S2 area_per_channel", peak.area_per_channel.len(), mask.n_top())?;
    fit_subset(
        mask,
        efficiency,
        &peak.area_per_channel,
        peak.area_fraction_top * peak.area,
        ChannelSubset::Top,
        mean_pe_per_photon,
    )
}

fn check_channels(what: &str, len: usize, needed: usize) -> Result<()> {
    if len < needed {
        return Err(Error::Validation(format!("{} has {} entries, need at least {}", what, len, needed)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> PatternFitConfig {
        PatternFitConfig { n_top_channels: 2, ..PatternFitConfig::default() }
    }

    fn s1(area: f64, aft: f64, per_channel: Vec<f64>) -> Peak {
        Peak {
            index: Some(0),
            area,
            area_fraction_top: aft,
            position: vec![1.0, 2.0, -30.0],
            area_per_channel: per_channel,
        }
    }

    #[test]
    fn test_s1_eligibility() {
        let c = config();
        let p = s1(10.0, 0.3, vec![]);
        assert!(s1_eligible(&p, &c));
        assert!(!s1_eligible(&Peak { index: Some(-1), ..p.clone() }, &c));
        assert!(!s1_eligible(&Peak { index: None, ..p.clone() }, &c));
        assert!(!s1_eligible(&Peak { area: 0.0, ..p.clone() }, &c));
        assert!(!s1_eligible(&Peak { area: f64::NAN, ..p.clone() }, &c));
        assert!(!s1_eligible(&Peak { area_fraction_top: -0.1, ..p.clone() }, &c));
        assert!(!s1_eligible(&Peak { position: vec![f64::NAN, 0.0, 0.0], ..p.clone() }, &c));
        assert!(!s1_eligible(&Peak { position: vec![70.0, 0.0, -5.0], ..p.clone() }, &c));
        // Zero top fraction is still a valid S1.
        assert!(s1_eligible(&Peak { area_fraction_top: 0.0, ..p }, &c));
    }

    #[test]
    fn test_s2_eligibility() {
        let c = config();
        let p = Peak {
            index: Some(3),
            area: 500.0,
            area_fraction_top: 0.7,
            position: vec![10.0, -10.0],
            area_per_channel: vec![],
        };
        assert!(s2_eligible(&p, &c));
        assert!(!s2_eligible(&Peak { area: 10.0, ..p.clone() }, &c));
        assert!(!s2_eligible(&Peak { area_fraction_top: 0.0, ..p.clone() }, &c));
        assert!(!s2_eligible(&Peak { position: vec![], ..p }, &c));
    }

    #[test]
    fn test_perfect_s1_scores_zero() {
        // 2 top + 2 bottom channels, all alive, flat map, observation matches exactly.
        let mask = ChannelMask::new(vec![true; 4], 2).unwrap();
        let peak = s1(40.0, 0.5, vec![10.0, 10.0, 10.0, 10.0]);
        let fit = fit_s1(&peak, &[1.0; 4], &mask, 1.2).unwrap();
        assert_eq!(fit.all.statistic, 0.0);
        assert_eq!(fit.top.statistic, 0.0);
        assert_eq!(fit.bottom.statistic, 0.0);
        assert_eq!(fit.all.pattern, vec![10.0; 4]);
    }

    #[test]
    fn test_s1_subsets_partition_channels() {
        let mask = ChannelMask::new(vec![true, false, true, true, true], 2).unwrap();
        let peak = s1(30.0, 0.4, vec![12.0, 99.0, 4.0, 9.0, 5.0]);
        let fit = fit_s1(&peak, &[1.0, 1.0, 2.0, 1.0, 1.0], &mask, 1.2).unwrap();
        assert_eq!(fit.all.per_channel.len(), 4);
        assert_eq!(fit.top.per_channel.len(), 1);
        assert_eq!(fit.bottom.per_channel.len(), 3);
        // Top pattern carries aft * area, bottom carries the rest.
        assert_relative_eq!(fit.top.pattern.iter().sum::<f64>(), 12.0, epsilon = 1e-12);
        assert_relative_eq!(fit.bottom.pattern.iter().sum::<f64>(), 18.0, epsilon = 1e-12);
        assert!(fit.all.statistic > 0.0);
    }

    #[test]
    fn test_dead_channel_observation_is_ignored() {
        let mask = ChannelMask::new(vec![true, false], 2).unwrap();
        let base = s1(5.0, 1.0, vec![5.0, 0.0]);
        let loud = s1(5.0, 1.0, vec![5.0, 1e6]);
        let a = fit_s1(&base, &[1.0, 1.0], &mask, 1.2).unwrap();
        let b = fit_s1(&loud, &[1.0, 1.0], &mask, 1.2).unwrap();
        assert_eq!(a.all.statistic, b.all.statistic);
    }

    #[test]
    fn test_s2_uses_top_only() {
        let mask = ChannelMask::new(vec![true; 4], 2).unwrap();
        let peak = Peak {
            index: Some(1),
            area: 100.0,
            area_fraction_top: 0.6,
            position: vec![0.0, 0.0],
            // Top-only observation is enough for an S2.
            area_per_channel: vec![30.0, 30.0],
        };
        let fit = fit_s2(&peak, &[1.0, 1.0], &mask, 1.2).unwrap();
        assert_eq!(fit.pattern, vec![30.0, 30.0]);
        assert_eq!(fit.statistic, 0.0);
    }

    #[test]
    fn test_out_of_domain_map_gives_nan() {
        let mask = ChannelMask::new(vec![true; 2], 1).unwrap();
        let peak = s1(5.0, 0.5, vec![2.5, 2.5]);
        let fit = fit_s1(&peak, &[f64::NAN, f64::NAN], &mask, 1.2).unwrap();
        assert!(fit.all.statistic.is_nan());
        assert!(fit.top.statistic.is_nan());
    }

    #[test]
    fn test_aft_above_one_poisons_bottom_only() {
        let mask = ChannelMask::new(vec![true; 2], 1).unwrap();
        let peak = s1(5.0, 1.2, vec![6.0, -1.0]);
        let fit = fit_s1(&peak, &[1.0, 1.0], &mask, 1.2).unwrap();
        assert!(fit.bottom.statistic.is_nan());
        assert!(fit.top.statistic.is_finite());
    }

    #[test]
    fn test_short_vectors_rejected() {
        let mask = ChannelMask::new(vec![true; 4], 2).unwrap();
        let peak = s1(5.0, 0.5, vec![1.0; 3]);
        assert!(fit_s1(&peak, &[1.0; 4], &mask, 1.2).is_err());
        let peak = s1(5.0, 0.5, vec![1.0; 4]);
        assert!(fit_s1(&peak, &[1.0; 2], &mask, 1.2).is_err());
    }
}
