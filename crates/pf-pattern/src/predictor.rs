use pf_core::{Error, Result};

use crate::mask::{ChannelMask, ChannelSubset};

/// Expected area on each usable channel.
///
/// The usable efficiencies are rescaled to sum to `total_area`. If
/// `total_area` or any usable efficiency is NaN, infinite or negative, or the
/// usable efficiencies sum to zero, every entry is NaN.
pub fn predict(efficiency: &[f64], total_area: f64, usable: &[bool]) -> Result<Vec<f64>> {
    if efficiency.len() != usable.len() {
        return Err(Error::Validation(format!(
            "efficiency/mask length mismatch: {} vs {}",
            efficiency.len(),
            usable.len()
        )));
    }
    let masked: Vec<f64> = efficiency.iter().zip(usable).filter_map(|(&e, &u)| u.then_some(e)).collect();

    let valid = total_area.is_finite()
        && total_area >= 0.0
        && masked.iter().all(|&e| e.is_finite() && e >= 0.0);
    let sum: f64 = masked.iter().sum();
    if !valid || !(sum > 0.0) {
        return Ok(vec![f64::NAN; masked.len()]);
    }

    let scale = total_area / sum;
    Ok(masked.into_iter().map(|e| e * scale).collect())
}

/// [`predict`] over one channel subset of a full-length efficiency vector.
pub fn predict_subset(
    mask: &ChannelMask,
    efficiency: &[f64],
    total_area: f64,
    subset: ChannelSubset,
) -> Result<Vec<f64>> {
    let range = mask.range(subset);
    if efficiency.len() < range.end {
        return Err(Error::Validation(format!(
            "efficiency vector has {} entries, {:?} needs {}",
            efficiency.len(),
            subset,
            range.end
        )));
    }
    predict(&efficiency[range], total_area, mask.flags(subset))
}
