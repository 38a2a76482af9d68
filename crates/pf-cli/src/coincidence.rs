//! `patternfit coincidence`: n-fold coincidence intervals and record tagging.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use pf_coincidence::{Record, coincidence, tag_in_intervals};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CoincidenceInput {
    /// Sorted signal times (ns).
    times: Vec<i64>,
    /// Records to tag against the intervals.
    #[serde(default)]
    records: Vec<Record>,
}

pub fn cmd_coincidence(input: &Path, nfold: usize, resolving_time: i64, output: Option<&PathBuf>) -> Result<()> {
    let json = std::fs::read_to_string(input).with_context(|| format!("failed to read '{}'", input.display()))?;
    let data: CoincidenceInput =
        serde_json::from_str(&json).with_context(|| format!("invalid coincidence input '{}'", input.display()))?;

    let mut intervals = coincidence(&data.times, nfold, resolving_time)?;
    tracing::info!(times = data.times.len(), intervals = intervals.len(), "coincidence complete");

    let output_json = if data.records.is_empty() {
        serde_json::json!({
            "nfold": nfold,
            "resolving_time": resolving_time,
            "intervals": intervals,
        })
    } else {
        let tags = tag_in_intervals(&data.records, &mut intervals);
        serde_json::json!({
            "nfold": nfold,
            "resolving_time": resolving_time,
            "intervals": intervals,
            "in_interval": tags,
        })
    };

    crate::write_json(output, output_json)
}
