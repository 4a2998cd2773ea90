use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use insights_cli::{init_tracing, run, Args, Settings, Verbosity};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(Verbosity::from_flags(args.verbose, args.quiet))?;

    let settings = Settings::from_args(&args).context("invalid arguments")?;
    let start = Instant::now();
    let analysis = run(&settings)?;

    info!(
        sequences = analysis.sequences.len(),
        output = %settings.output_dir.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "analysis complete"
    );
    Ok(())
}
