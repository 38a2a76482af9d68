//! Probability building blocks for PatternFit.
//!
//! - [`binomial`]: binomial point probability and tails on a continuous count
//!   axis, plus the exact two-sided test
//! - [`modpoisson`]: the modified-Poisson `-2 ln L` statistic used to compare
//!   per-channel area patterns
//! - [`math`]: small numeric helpers (signed log-gamma continuation, `xlogy`,
//!   `linspace`)

pub mod binomial;
pub mod math;
pub mod modpoisson;
