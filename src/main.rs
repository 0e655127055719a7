// # Running
//
// - `cargo run --release -- trips.csv`
// - `cargo run --release -- trips.csv --top-zones 5 --top-slots 20 --format json`
// - `cargo run --release -- trips.csv --expected correct_results.txt`
//
// - Profiling:
//      - `cargo build --profile profiling`
//      - `samply record ./target/profiling/trip_hotspots trips.csv`
//
// - Heap profiling:
//      - `cargo run --release --features dhat-heap -- trips.csv`

mod cli;

use std::{path::Path, process::ExitCode, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, OutputFormat};
use trip_hotspots::{Aggregator, Report};

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

/// Logs go to stderr, warnings only unless `--debug` or `RUST_LOG` says otherwise.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let start = Instant::now();

    let mut aggregator = Aggregator::new();
    let stats = if cli.mmap {
        aggregator.ingest_path_mapped(&cli.input)
    } else {
        aggregator.ingest_path(&cli.input)
    };
    let report = Report::from_aggregator(&aggregator, cli.top_zones, cli.top_slots);

    eprintln!("Run completed in: {:?} seconds", start.elapsed().as_secs_f32());
    eprintln!("{} trips counted, {} lines skipped", stats.accepted, stats.rejected);

    let rendered = match cli.format {
        OutputFormat::Text => report.render_text(),
        OutputFormat::Json => report.render_json().context("rendering report as json")?,
    };
    print!("{rendered}");

    if let Some(path) = &cli.output {
        store_result(path, &rendered)?;
    }

    if let Some(path) = &cli.expected {
        if !check_correct(&report, path)? {
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn store_result(path: &Path, rendered: &str) -> Result<()> {
    std::fs::write(path, rendered).with_context(|| format!("writing report to {}", path.display()))?;
    eprintln!("Results stored in \"{}\"", path.display());
    Ok(())
}

fn check_correct(report: &Report, expected_path: &Path) -> Result<bool> {
    let expected_text = std::fs::read_to_string(expected_path)
        .with_context(|| format!("reading expected report {}", expected_path.display()))?;
    let expected = Report::parse_text(&expected_text)
        .with_context(|| format!("parsing expected report {}", expected_path.display()))?;

    let mismatches = report.diff(&expected);
    if mismatches.is_empty() {
        eprintln!("PASSED!");
        return Ok(true);
    }

    eprintln!("ERROR, output does not match expected!");
    for mismatch in &mismatches {
        eprintln!("{mismatch}");
    }
    Ok(false)
}
