//! # pf-core
//!
//! Shared building blocks for PatternFit:
//! - the workspace [`Error`] / [`Result`] pair
//! - the event data model and per-event result structs ([`types`])
//! - traits for the externally supplied position maps ([`traits`])

#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{EfficiencyMap, ProbabilityMap};
pub use types::{Event, EventScores, FractionProbabilities, LikelihoodScores, Peak};

/// Crate version, shared by the CLI `version` command.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
