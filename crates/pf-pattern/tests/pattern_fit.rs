//! End-to-end scoring through `PatternFitContext` with analytic maps.

use std::sync::Arc;

use approx::assert_relative_eq;
use pf_core::{EfficiencyMap, Event, Peak, ProbabilityMap};
use pf_pattern::{ChannelMask, EventLookups, PatternFitConfig, PatternFitContext, score_batch_with_lookups};

const N_TOP: usize = 4;
const N_CHANNELS: usize = 8;

/// Efficiency falls off with distance from a channel's x coordinate.
fn s1_map() -> Arc<dyn EfficiencyMap> {
    Arc::new(|pos: &[f64]| -> Vec<f64> {
        if pos.iter().any(|v| !v.is_finite()) {
            return vec![f64::NAN; N_CHANNELS];
        }
        (0..N_CHANNELS).map(|i| 1.0 / (1.0 + (pos[0] - (i % N_TOP) as f64 * 10.0).abs())).collect()
    })
}

fn s2_map() -> Arc<dyn EfficiencyMap> {
    Arc::new(|pos: &[f64]| -> Vec<f64> {
        (0..N_TOP).map(|i| 1.0 / (1.0 + (pos[0] - i as f64 * 10.0).powi(2))).collect()
    })
}

fn aft_map() -> Arc<dyn ProbabilityMap> {
    Arc::new(|pos: &[f64]| -> f64 { if pos.len() == 3 { 0.25 } else { f64::NAN } })
}

fn context(config: PatternFitConfig) -> PatternFitContext {
    let usable = (0..N_CHANNELS).map(|i| !DEAD.contains(&i)).collect();
    let mask = ChannelMask::new(usable, N_TOP).unwrap();
    PatternFitContext::new(config, mask, s1_map(), s2_map(), aft_map()).unwrap()
}

fn config() -> PatternFitConfig {
    PatternFitConfig { n_top_channels: N_TOP, ..PatternFitConfig::default() }
}

const DEAD: [usize; 2] = [2, 7];

/// An event whose S1 and S2 follow the map prediction on live channels, with
/// channel 0 of the S1 scaled by `distort`.
fn event(time: i64, x: f64, distort: f64) -> Event {
    let mut s1_channels = s1_map().efficiencies(&[x, 0.0, -10.0]);
    s1_channels.iter_mut().for_each(|v| *v *= 50.0);
    s1_channels[0] *= distort;
    let mut s2_channels = s2_map().efficiencies(&[x, 0.0]);
    s2_channels.iter_mut().for_each(|v| *v *= 3000.0);
    for &i in &DEAD {
        s1_channels[i] = 0.0;
        if i < N_TOP {
            s2_channels[i] = 0.0;
        }
    }

    let s1_area: f64 = s1_channels.iter().sum();
    let s1_top: f64 = s1_channels[..N_TOP].iter().sum();
    let s2_top: f64 = s2_channels.iter().sum();
    let s2_area = 2.0 * s2_top;

    Event {
        time,
        endtime: time + 1000,
        s1: Peak {
            index: Some(0),
            area: s1_area,
            area_fraction_top: s1_top / s1_area,
            position: vec![x, 0.0, -10.0],
            area_per_channel: s1_channels,
        },
        alt_s1: Peak::missing(),
        s2: Peak {
            index: Some(1),
            area: s2_area,
            area_fraction_top: s2_top / s2_area,
            position: vec![x, 0.0],
            area_per_channel: s2_channels,
        },
        alt_s2: Peak::missing(),
    }
}

#[test]
fn distortion_raises_the_s1_statistic() {
    let ctx = context(config());
    let clean = ctx.score(&event(0, 5.0, 1.0)).unwrap();
    let dirty = ctx.score(&event(0, 5.0, 3.0)).unwrap();
    assert!(clean.likelihood.s1_2llh.abs() < 1e-6);
    assert!(dirty.likelihood.s1_2llh > clean.likelihood.s1_2llh + 1.0);
    assert!(clean.likelihood.s2_2llh.abs() < 1e-6);
}

#[test]
fn outside_radius_is_nan() {
    let ctx = context(config());
    let s = ctx.score(&event(0, 80.0, 1.0)).unwrap();
    assert!(s.likelihood.s1_2llh.is_nan());
    assert!(s.likelihood.s2_2llh.is_nan());
    // The fraction-top test does not depend on the fiducial radius.
    assert!(s.s1_fraction.area_discrete.is_finite());
}

#[test]
fn batch_preserves_order_and_matches_single_scoring() {
    let ctx = context(PatternFitConfig { store_per_channel: true, ..config() });
    let events: Vec<Event> = (0..200).map(|i| event(i * 10, (i % 40) as f64, 1.0 + (i % 3) as f64)).collect();
    let columns = ctx.score_batch(&events).unwrap();
    assert_eq!(columns.len(), events.len());
    assert_eq!(columns.channels.len(), events.len());
    for (i, e) in events.iter().enumerate() {
        assert_eq!(columns.time[i], e.time);
        let single = ctx.score(e).unwrap();
        let (a, b) = (columns.s1_2llh[i], single.likelihood.s1_2llh);
        assert!(a == b || (a.is_nan() && b.is_nan()));
    }
}

#[test]
fn dead_channels_are_zero_in_diagnostics() {
    let ctx = context(PatternFitConfig { store_per_channel: true, ..config() });
    let s = ctx.score(&event(0, 12.0, 1.0)).unwrap();
    let diag = s.channels.unwrap();
    assert_eq!(diag.s1_pattern.len(), N_CHANNELS);
    assert_eq!(diag.s1_pattern[2], 0.0);
    assert_eq!(diag.s1_pattern[7], 0.0);
    assert_eq!(diag.s2_pattern.len(), N_TOP);
    assert_eq!(diag.s2_pattern[2], 0.0);
    assert!(diag.alt_s2_pattern.iter().all(|v| v.is_nan()));
}

#[test]
fn supplied_lookups_match_context_scoring() {
    let ctx = context(config());
    let events: Vec<Event> = (0..20).map(|i| event(i, i as f64 * 2.0, 1.5)).collect();
    let lookups: Vec<EventLookups> = events.iter().map(|e| EventLookups::evaluate(e, &ctx)).collect();
    let a = ctx.score_batch(&events).unwrap();
    let b = score_batch_with_lookups(&events, &lookups, ctx.config(), ctx.mask()).unwrap();
    for i in 0..events.len() {
        assert_relative_eq!(a.s1_top_2llh[i], b.s1_top_2llh[i], epsilon = 0.0);
        assert_relative_eq!(
            a.s1_photon_fraction_top_continuous_probability[i],
            b.s1_photon_fraction_top_continuous_probability[i],
            epsilon = 0.0
        );
    }
}

#[test]
fn mismatched_split_is_rejected() {
    let mask = ChannelMask::new(vec![true; N_CHANNELS], N_TOP + 1).unwrap();
    let err = PatternFitContext::new(config(), mask, s1_map(), s2_map(), aft_map()).unwrap_err();
    assert!(matches!(err, pf_core::Error::Validation(_)));
}
