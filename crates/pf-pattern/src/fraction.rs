use pf_core::{FractionProbabilities, Peak};
use pf_prob::binomial::{point_probability, two_sided_test};

/// Binomial consistency of an observed top/bottom split with the
/// area-fraction-top map probability `aft_probability`.
///
/// Area mode uses `n = area`, `k = area * area_fraction_top`. Photon mode
/// first converts the area to a photon count with `mean_pe_per_photon`.
/// Non-finite inputs give all-NaN probabilities.
pub fn fraction_probabilities(
    aft_probability: f64,
    area: f64,
    area_fraction_top: f64,
    mean_pe_per_photon: f64,
) -> FractionProbabilities {
    if !(aft_probability.is_finite() && area.is_finite() && area_fraction_top.is_finite()) {
        return FractionProbabilities::nan();
    }

    let area_top = area * area_fraction_top;
    let photons = area / mean_pe_per_photon;
    let photons_top = photons * area_fraction_top;

    FractionProbabilities {
        area_continuous: two_sided_test(area_top, area, aft_probability),
        area_discrete: point_probability(area_top, area, aft_probability),
        photon_continuous: two_sided_test(photons_top, photons, aft_probability),
        photon_discrete: point_probability(photons_top, photons, aft_probability),
    }
}

/// [`fraction_probabilities`] for a peak; a missing peak gives all NaN.
pub fn peak_fraction_probabilities(peak: &Peak, aft_probability: f64, mean_pe_per_photon: f64) -> FractionProbabilities {
    if !peak.is_present() {
        return FractionProbabilities::nan();
    }
    fraction_probabilities(aft_probability, peak.area, peak.area_fraction_top, mean_pe_per_photon)
}
