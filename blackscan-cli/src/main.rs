// blackscan-cli/src/main.rs
//
// This file defines the command-line interface (CLI) for the blackscan
// black frame analysis tool.
//
// Responsibilities include:
// - Parsing user-provided arguments (see cli.rs).
// - Setting up logging via env_logger (RUST_LOG controls verbosity).
// - Expanding input paths into the list of video files to analyze.
// - Configuring the blackscan-core library from CLI arguments.
// - Running the batch and rendering its events (see output.rs).
// - Writing requested CSV/JSON exports.
// - Managing the process exit code based on per-file outcomes.

mod cli;
mod output;

use std::process;
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};

use blackscan_core::{AnalysisStatus, BatchCoordinator, EventDispatcher};
use cli::{AnalyzeArgs, Cli, Commands};
use output::TerminalReporter;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Analyze(args) => run_analyze(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_analyze(args: AnalyzeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.detection_config()?;
    let files = blackscan_core::collect_video_files(&args.inputs)?;
    info!("found {} video file(s) to analyze", files.len());

    if args.no_ranges && (args.ranges_csv.is_some() || args.ranges_json.is_some()) {
        warn!("--no-ranges is set; range exports will be empty");
    }

    println!(
        "Analysis started at {} ({} file(s))",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        files.len()
    );

    let mut dispatcher = EventDispatcher::new();
    dispatcher.add_handler(Arc::new(TerminalReporter::new()));

    let mut batch = BatchCoordinator::new(files, config);
    let results = batch.run(&dispatcher);

    if let Some(path) = &args.frames_csv {
        blackscan_core::export_frames_csv(path, &results)?;
        println!("Wrote frame CSV: {}", path.display());
    }
    if let Some(path) = &args.frames_json {
        blackscan_core::export_frames_json(path, &results)?;
        println!("Wrote frame JSON: {}", path.display());
    }
    if let Some(path) = &args.ranges_csv {
        blackscan_core::export_ranges_csv(path, &results)?;
        println!("Wrote range CSV: {}", path.display());
    }
    if let Some(path) = &args.ranges_json {
        blackscan_core::export_ranges_json(path, &results)?;
        println!("Wrote range JSON: {}", path.display());
    }

    let completed = results
        .iter()
        .filter(|r| r.status == AnalysisStatus::Completed)
        .count();
    let failed = results
        .iter()
        .filter(|r| r.status == AnalysisStatus::Failed)
        .count();
    let total_hits: usize = results.iter().map(|r| r.hits.len()).sum();
    let total_ranges: usize = results.iter().map(|r| r.ranges.len()).sum();

    println!(
        "Done: {completed}/{} file(s) analyzed, {total_hits} black frame(s), {total_ranges} range(s)",
        results.len()
    );

    if failed > 0 {
        return Err(format!("{failed} file(s) failed analysis").into());
    }
    Ok(())
}
