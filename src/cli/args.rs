//! Command-line argument definitions for the ESRI grid processor
//!
//! Defines the CLI using the clap derive API. Devices are selected with
//! `--dev`, and each device takes its settings from its own flag (`--out`
//! for the file, `--db` for the store).

use crate::config::{CompressionAlgorithm, RunConfig, SinkKind, parse_sink_list};
use crate::constants::{
    DEFAULT_DEVICES, DEFAULT_OUTPUT_FILE, DEFAULT_REGION_NAME, STORE_WRITE_BATCH_SIZE,
};
use crate::error::{GridError, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the ESRI grid processor
///
/// Reads an ESRI ASCII raster, derives the latitude and longitude of every
/// cell, and streams the samples to the console, a flat file, and/or a
/// Parquet store.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "esri-grid-processor",
    version,
    about = "Stream ESRI ASCII raster cells as geocoordinate-tagged samples",
    long_about = "Parses an ESRI ASCII grid (ncols, nrows, xllcorner, yllcorner, cellsize and an \
                  optional nodata_value, followed by the data block), validates its structure, \
                  and delivers one latitude/longitude/value sample per cell to the selected \
                  output devices without holding the grid in memory."
)]
pub struct Args {
    /// ESRI ASCII grid file to read
    #[arg(long = "in", value_name = "PATH", help = "ESRI ASCII grid file to read")]
    pub input_path: PathBuf,

    /// Output devices (comma-separated list)
    ///
    /// Any of `con` (console), `file` (flat file) and `db` (Parquet store).
    /// Cells are delivered to the devices in the order given.
    #[arg(
        long = "dev",
        value_name = "LIST",
        default_value = DEFAULT_DEVICES,
        help = "Output devices: con, file, db (comma-separated)"
    )]
    pub devices: DeviceList,

    /// Destination of the file device
    #[arg(
        long = "out",
        value_name = "PATH",
        default_value = DEFAULT_OUTPUT_FILE,
        help = "Output file for the file device"
    )]
    pub output_file: PathBuf,

    /// Directory holding the Parquet store tables
    ///
    /// The store writes `<region>_header.parquet` and `<region>_data.parquet`
    /// into this directory, creating it if needed.
    #[arg(long = "db", value_name = "DIR", help = "Store directory for the db device")]
    pub store_location: Option<PathBuf>,

    /// Region name recorded with the header
    #[arg(
        long = "name",
        value_name = "REGION",
        default_value = DEFAULT_REGION_NAME,
        help = "Region name recorded with the header"
    )]
    pub region_name: String,

    /// Write a `latitude,longitude,value` line at the top of the output file
    #[arg(long = "csv-header", help = "Write a column header line to the output file")]
    pub csv_header: bool,

    /// Parquet compression for the store
    #[arg(
        long = "compression",
        value_enum,
        default_value = "snappy",
        help = "Parquet compression for the db device"
    )]
    pub compression: CompressionAlgorithm,

    /// Cells buffered per Parquet batch
    #[arg(
        long = "batch-size",
        value_name = "CELLS",
        default_value_t = STORE_WRITE_BATCH_SIZE,
        help = "Cells buffered per Parquet batch"
    )]
    pub batch_size: usize,

    /// Show a progress bar over grid rows
    #[arg(long = "progress", help = "Show a progress bar over grid rows")]
    pub progress: bool,

    /// Parse and validate the whole grid without writing to any device
    #[arg(long = "validate-only", help = "Validate the grid without writing any output")]
    pub validate_only: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Hides the banner, the progress bar and the summary.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Format of the run summary
    #[arg(
        long = "report",
        value_enum,
        default_value = "human",
        help = "Format of the run summary"
    )]
    pub report: OutputFormat,
}

/// Output format options for the run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

/// Wrapper for parsing comma-separated device lists
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceList {
    pub sinks: Vec<SinkKind>,
}

impl FromStr for DeviceList {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let sinks = parse_sink_list(s)?;
        if sinks.is_empty() {
            return Err(GridError::configuration("device list cannot be empty"));
        }
        Ok(DeviceList { sinks })
    }
}

impl Args {
    /// Build the run configuration described by these arguments
    pub fn to_config(&self) -> RunConfig {
        let mut config = RunConfig::default()
            .with_input(&self.input_path)
            .with_region_name(&self.region_name)
            .with_sinks(self.devices.sinks.clone())
            .with_output_file(&self.output_file)
            .with_compression(self.compression)
            .with_batch_size(self.batch_size);

        if let Some(location) = &self.store_location {
            config = config.with_store_location(location);
        }
        if self.csv_header {
            config = config.with_column_header();
        }
        if self.show_progress() {
            config = config.with_progress();
        }
        if self.validate_only {
            config = config.with_validate_only();
        }
        config
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars are opt-in and never shown in quiet mode
    pub fn show_progress(&self) -> bool {
        self.progress && !self.quiet
    }

    /// Banner and human summary are hidden in quiet mode and for JSON reports
    pub fn show_banner(&self) -> bool {
        !self.quiet && self.report == OutputFormat::Human
    }

    /// JSON summaries move to stderr while the console device owns stdout
    pub fn json_report_to_stderr(&self) -> bool {
        self.report == OutputFormat::Json
            && !self.validate_only
            && self.devices.sinks.contains(&SinkKind::Console)
    }
}
