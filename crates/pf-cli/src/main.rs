//! PatternFit CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod coincidence;
mod score;

#[derive(Parser)]
#[command(name = "patternfit")]
#[command(about = "PatternFit - optical pattern likelihoods and fraction-top tests")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exact two-sided binomial test with continuous k and n
    BinomTest {
        /// Successes (may be non-integer)
        #[arg(long, allow_negative_numbers = true)]
        k: f64,

        /// Trials (may be non-integer)
        #[arg(long, allow_negative_numbers = true)]
        n: f64,

        /// Success probability
        #[arg(long, allow_negative_numbers = true)]
        p: f64,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score a batch of events with pre-evaluated map lookups
    Score {
        /// Run configuration (JSON). Defaults apply when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Batch file: gains, events and lookups (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Threads (0 = auto).
        #[arg(long, default_value = "0")]
        threads: usize,
    },

    /// n-fold coincidence intervals of sorted times
    Coincidence {
        /// Input file: times and optional records (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Coincidence level
        #[arg(long, default_value = "4")]
        nfold: usize,

        /// Coincidence window (ns)
        #[arg(long, default_value = "300")]
        resolving_time: i64,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::BinomTest { k, n, p, output } => cmd_binom_test(k, n, p, output.as_ref()),
        Commands::Score { config, input, output, threads } => {
            score::cmd_score(config.as_ref(), &input, output.as_ref(), threads)
        }
        Commands::Coincidence { input, nfold, resolving_time, output } => {
            coincidence::cmd_coincidence(&input, nfold, resolving_time, output.as_ref())
        }
        Commands::Version => {
            println!("patternfit {}", pf_core::VERSION);
            Ok(())
        }
    }
}

fn cmd_binom_test(k: f64, n: f64, p: f64, output: Option<&PathBuf>) -> Result<()> {
    use pf_prob::binomial;

    let output_json = match binomial::exact_test(k, n, p) {
        Ok(p_value) => serde_json::json!({
            "k": k,
            "n": n,
            "p": p,
            "pmf": binomial::pmf(k, n, p),
            "cdf": binomial::cdf(k, n, p),
            "sf": binomial::sf(k, n, p),
            "p_value": p_value,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "binomial test not defined for these parameters");
            serde_json::json!({
                "k": k,
                "n": n,
                "p": p,
                "pmf": null,
                "cdf": null,
                "sf": null,
                "p_value": null,
            })
        }
    };

    write_json(output, output_json)
}

/// Best-effort global pool size; if a global pool already exists, keep going.
pub(crate) fn configure_threads(threads: usize) {
    if threads > 0 {
        let _ = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global();
    }
}

pub(crate) fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
