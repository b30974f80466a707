use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zonecast::io;
use zonecast::pipeline::{self, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "zonecast")]
#[command(about = "Forecast per-zone bandwidth and peak users for future hourly slots")]
struct Args {
    /// Training observations CSV.
    train: PathBuf,

    /// Test rows CSV (id, zone, date, hour).
    test: PathBuf,

    /// Output submission CSV.
    #[arg(short, long, default_value = "submission.csv")]
    output: PathBuf,

    /// Pipeline variant to run.
    #[arg(long, value_enum, default_value_t = Variant::Combined)]
    variant: Variant,

    /// Override the ensemble seed (the combined variant is unseeded by
    /// default).
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Variant {
    Baseline,
    Combined,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,zonecast=debug"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mut config = match args.variant {
        Variant::Baseline => PipelineConfig::baseline(),
        Variant::Combined => PipelineConfig::combined(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    let train = io::load_train(&args.train).context("failed to load training data")?;
    let test = io::load_test(&args.test).context("failed to load test data")?;

    let submission = pipeline::run(&config, train, &test).context("pipeline failed")?;

    io::write_submission(&args.output, &submission).context("failed to write submission")?;
    Ok(())
}
