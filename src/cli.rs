//! Command line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// One row per line under a heading per section
    Text,
    /// Pretty printed JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "trip_hotspots")]
#[command(version)]
#[command(about = "Busiest pickup zones and hourly slots from a trip-record file", long_about = None)]
pub struct Cli {
    /// Trip-record file to read
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// How many zones to report
    #[arg(short = 'z', long = "top-zones", value_name = "K", default_value = "10")]
    pub top_zones: usize,

    /// How many (zone, hour) slots to report
    #[arg(short = 's', long = "top-slots", value_name = "K", default_value = "10")]
    pub top_slots: usize,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Read the input through a memory map instead of a buffered reader
    #[arg(long = "mmap")]
    pub mmap: bool,

    /// Also store the rendered report in this file
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Compare the report against a known good text report
    #[arg(long = "expected", value_name = "PATH")]
    pub expected: Option<PathBuf>,

    /// Log every skipped line to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
