//! # pf-pattern
//!
//! Per-event optical pattern scoring.
//!
//! For every event this crate produces:
//! - five `-2 ln L` likelihood ratios comparing the observed per-channel area
//!   pattern to the pattern predicted by an optical map at the reconstructed
//!   position (main S1 on all / top / bottom channels, main and alternate S2
//!   on top channels)
//! - exact binomial probabilities that the observed S1 top/bottom split is
//!   consistent with the area-fraction-top map, on areas and on inferred
//!   photon counts
//!
//! ## Architecture
//!
//! Maps and the channel mask are loaded once per run into a
//! [`PatternFitContext`]. Scoring an event is a pure function of the event
//! and its map lookups ([`score_event`]), so batches fan out over events with
//! Rayon and no shared mutable state.

#![warn(missing_docs)]

/// Columnar batch output.
pub mod columns;
/// Run configuration.
pub mod config;
/// Run context, lookups and batch scoring.
pub mod fitter;
/// Area-fraction-top binomial probabilities.
pub mod fraction;
/// Pattern likelihood-ratio aggregation.
pub mod likelihood;
/// Usable-channel mask with its top/bottom split.
pub mod mask;
/// Expected area per channel from relative efficiencies.
pub mod predictor;

pub use columns::PatternFitColumns;
pub use config::PatternFitConfig;
pub use fitter::{EventLookups, PatternFitContext, score_batch_with_lookups, score_event};
pub use mask::{ChannelMask, ChannelSubset};
