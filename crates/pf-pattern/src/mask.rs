use std::ops::Range;

use pf_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// A channel selection for one likelihood sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSubset {
    /// Every usable channel.
    All,
    /// Usable channels of the top array.
    Top,
    /// Usable channels of the bottom array.
    Bottom,
}

/// Usable (not dead) channels, split into a top and a bottom array.
///
/// Built once per run and shared read-only by every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMask {
    usable: Vec<bool>,
    n_top: usize,
}

impl ChannelMask {
    /// Mask from explicit flags; channels `0..n_top` form the top array.
    pub fn new(usable: Vec<bool>, n_top: usize) -> Result<Self> {
        if n_top > usable.len() {
            return Err(Error::Validation(format!(
                "n_top ({}) exceeds channel count ({})",
                n_top,
                usable.len()
            )));
        }
        Ok(Self { usable, n_top })
    }

    /// Mask from per-channel gains: a channel with zero (or non-positive,
    /// non-finite) gain is dead.
    pub fn from_gains(gains: &[f64], n_top: usize) -> Result<Self> {
        Self::new(gains.iter().map(|&g| g.is_finite() && g > 0.0).collect(), n_top)
    }

    /// Total channel count.
    pub fn len(&self) -> usize {
        self.usable.len()
    }

    /// Whether there are no channels at all.
    pub fn is_empty(&self) -> bool {
        self.usable.is_empty()
    }

    /// The top/bottom split index.
    pub fn n_top(&self) -> usize {
        self.n_top
    }

    /// Channel index range covered by `subset`.
    pub fn range(&self, subset: ChannelSubset) -> Range<usize> {
        match subset {
            ChannelSubset::All => 0..self.usable.len(),
            ChannelSubset::Top => 0..self.n_top,
            ChannelSubset::Bottom => self.n_top..self.usable.len(),
        }
    }

    /// Usable flags over `subset`'s range.
    pub fn flags(&self, subset: ChannelSubset) -> &[bool] {
        &self.usable[self.range(subset)]
    }

    /// Number of usable channels in `subset`.
    pub fn n_usable(&self, subset: ChannelSubset) -> usize {
        self.flags(subset).iter().filter(|&&u| u).count()
    }

    /// Values of the usable channels of `subset`, in channel order.
    ///
    /// `values` is indexed by channel and must cover `subset`'s range; trailing
    /// entries past it are ignored.
    pub fn select(&self, values: &[f64], subset: ChannelSubset) -> Result<Vec<f64>> {
        let range = self.range(subset);
        if values.len() < range.end {
            return Err(Error::Validation(format!(
                "per-channel vector has {} entries, {:?} needs {}",
                values.len(),
                subset,
                range.end
            )));
        }
        Ok(values[range.clone()]
            .iter()
            .zip(self.flags(subset))
            .filter_map(|(&v, &u)| u.then_some(v))
            .collect())
    }

    /// Inverse of [`select`](Self::select): spread compact usable-channel
    /// values back over `subset`'s range, writing `fill` on dead channels.
    pub fn scatter(&self, compact: &[f64], subset: ChannelSubset, fill: f64) -> Result<Vec<f64>> {
        let n_usable = self.n_usable(subset);
        if compact.len() != n_usable {
            return Err(Error::Validation(format!(
                "compact vector has {} entries, {:?} has {} usable channels",
                compact.len(),
                subset,
                n_usable
            )));
        }
        let mut values = compact.iter();
        Ok(self
            .flags(subset)
            .iter()
            .map(|&u| if u { values.next().copied().unwrap_or(fill) } else { fill })
            .collect())
    }
}
