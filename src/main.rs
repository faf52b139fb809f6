//! Command-line front end. Argument handling and output only; all of the
//! analysis lives in the library.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};

use tsscan::{Analyzer, Baseline};

#[derive(Parser)]
#[command(name = "tsscan")]
#[command(about = "Static analyzer for TorqueScript mod trees")]
#[command(version)]
struct Args {
    /// Directories to scan for .cs script files
    #[arg(required = true)]
    targets: Vec<PathBuf>,

    /// Worker threads for the parse stage (0 = run sequentially)
    #[arg(short, long, default_value_t = 0)]
    jobs: usize,

    /// Previously exported datablock table to merge in as a base layer
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Export this run's datablock table for use as a future baseline
    #[arg(long)]
    export_baseline: Option<PathBuf>,

    /// Write the JSON result model here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut analyzer = Analyzer::new(args.targets).jobs(args.jobs);
    if let Some(path) = &args.baseline {
        if let Some(baseline) = Baseline::load(path) {
            analyzer = analyzer.baseline(baseline);
        }
    }

    let analysis = match analyzer.run() {
        Ok(analysis) => analysis,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    for diagnostic in &analysis.diagnostics {
        warn!(code = %diagnostic.code, "{}", diagnostic.message);
    }

    if let Some(path) = &args.export_baseline {
        let baseline = Baseline::from_project(&analysis.project);
        if let Err(e) = baseline.save(path) {
            error!("failed to export baseline to {:?}: {}", path, e);
            return ExitCode::FAILURE;
        }
    }

    let json = match serde_json::to_string_pretty(&analysis) {
        Ok(json) => json,
        Err(e) => {
            error!("failed to serialize result model: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match &args.output {
        Some(path) => {
            if let Err(e) = fs::write(path, json) {
                error!("failed to write {:?}: {}", path, e);
                return ExitCode::FAILURE;
            }
        }
        None => println!("{json}"),
    }

    ExitCode::SUCCESS
}
