//! Batch analysis over exported station and TPU data.
//!
//! Reads a JSON bundle of station rows, reference coordinates and TPU
//! boundaries, runs reconciliation and the nearest-station join, and writes
//! the results as JSON (plus an optional CSV proximity table).

use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mtr_tpu::pipeline::{self, PipelineInput};
use mtr_tpu::AnalysisConfig;

#[derive(Parser, Debug)]
#[command(name = "analyze")]
#[command(about = "Reconcile MTR stations and join TPUs to their nearest station")]
struct Args {
    /// JSON bundle with `stations`, `reference` and `boundaries`
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the JSON results
    #[arg(short, long)]
    output: PathBuf,

    /// TOML config (tolerance, bounds, bucket edges); defaults if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write the proximity table as CSV
    #[arg(long)]
    proximity_csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AnalysisConfig::load_from_file(path)?,
        None => AnalysisConfig::default(),
    };

    info!("Reading input bundle from {}", args.input.display());
    let file = File::open(&args.input).context("Failed to open input bundle")?;
    let input: PipelineInput =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse input bundle")?;

    let output = pipeline::run(&input, &config)?;

    let json = serde_json::to_string_pretty(&output)?;
    fs::write(&args.output, json).context("Failed to write results")?;
    info!("Results written to {}", args.output.display());

    if let Some(path) = &args.proximity_csv {
        let mut writer = csv::Writer::from_path(path).context("Failed to create CSV file")?;
        for record in &output.proximity {
            writer.serialize(record)?;
        }
        writer.flush()?;
        info!(
            "Wrote {} proximity rows to {}",
            output.proximity.len(),
            path.display()
        );
    }

    info!(
        "Stations: {} verified, {} corrected, {} added, {} not found",
        output.summary.verified,
        output.summary.corrected,
        output.summary.added,
        output.summary.not_found
    );
    for row in &output.bucket_counts {
        info!("  {} {}: {}", row.year, row.bucket, row.count);
    }

    Ok(())
}
