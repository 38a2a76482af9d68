//! `patternfit score`: pattern-fit a batch with pre-evaluated map lookups.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use pf_core::Event;
use pf_pattern::{ChannelMask, EventLookups, PatternFitConfig, score_batch_with_lookups};

/// Batch input file.
///
/// `lookups[i]` holds the optical-map values for `events[i]`; maps are
/// evaluated upstream.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchInput {
    /// Per-channel gains; a zero gain marks a dead channel.
    gains: Vec<f64>,
    events: Vec<Event>,
    lookups: Vec<EventLookups>,
}

fn load_config(path: Option<&PathBuf>) -> Result<PatternFitConfig> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            PatternFitConfig::from_path(path).with_context(|| format!("invalid config '{}'", path.display()))
        }
        None => Ok(PatternFitConfig::default()),
    }
}

fn load_batch(path: &Path) -> Result<BatchInput> {
    tracing::info!(path = %path.display(), "loading batch");
    let json = std::fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    let batch: BatchInput =
        serde_json::from_str(&json).with_context(|| format!("invalid batch file '{}'", path.display()))?;
    Ok(batch)
}

pub fn cmd_score(config: Option<&PathBuf>, input: &Path, output: Option<&PathBuf>, threads: usize) -> Result<()> {
    crate::configure_threads(threads);

    let config = load_config(config)?;
    let batch = load_batch(input)?;
    let mask = ChannelMask::from_gains(&batch.gains, config.n_top_channels)?;
    tracing::info!(
        events = batch.events.len(),
        channels = mask.len(),
        n_top = mask.n_top(),
        "batch loaded"
    );

    let columns = score_batch_with_lookups(&batch.events, &batch.lookups, &config, &mask)?;
    tracing::info!(rows = columns.len(), "scoring complete");

    crate::write_json(output, serde_json::to_value(&columns)?)
}
