//! Configuration management and validation.
//!
//! [`RunConfig`] is built once (normally from command-line arguments) and
//! handed to the processor. It names the input grid, the active output
//! devices and their settings, and is validated before any file is touched.

use crate::constants::{DEFAULT_OUTPUT_FILE, DEFAULT_REGION_NAME, STORE_WRITE_BATCH_SIZE};
use crate::error::{GridError, Result};
use crate::sink::{ConsoleSink, FileSink, OutputSink, StoreSink};
use crate::store::ParquetRepository;
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// Supported compression algorithms for the Parquet store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    #[default]
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

/// Output device selectable for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Console,
    File,
    Store,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Console => "console",
            SinkKind::File => "file",
            SinkKind::Store => "store",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkKind {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "con" | "console" => Ok(SinkKind::Console),
            "file" => Ok(SinkKind::File),
            "db" | "store" => Ok(SinkKind::Store),
            other => Err(GridError::configuration(format!(
                "unknown output device '{}' (expected con, file or db)",
                other
            ))),
        }
    }
}

/// Parse a comma-separated device list such as `con,file,db`
///
/// Duplicates are dropped, keeping first-seen order.
pub fn parse_sink_list(list: &str) -> Result<Vec<SinkKind>> {
    let mut kinds = Vec::new();
    for token in list.split(',').filter(|t| !t.trim().is_empty()) {
        let kind = token.parse::<SinkKind>()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

/// Whether a region name can be used as a file stem inside the store directory
fn is_plain_file_stem(name: &str) -> bool {
    !name.contains(['/', '\\']) && !name.contains("..") && name != "."
}

/// Settings for one processing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Grid file to read
    pub input_path: Option<PathBuf>,

    /// Region name recorded with the header
    pub region_name: String,

    /// Active output devices, in delivery order
    pub sinks: Vec<SinkKind>,

    /// Destination of the file sink
    pub output_file: PathBuf,

    /// Write a column header line before the file sink's records
    pub include_column_header: bool,

    /// Directory holding the Parquet store tables
    pub store_location: Option<PathBuf>,

    /// Compression used by the Parquet store
    pub compression: CompressionAlgorithm,

    /// Cells buffered per Parquet batch
    pub batch_size: usize,

    /// Show a progress bar over rows
    pub show_progress: bool,

    /// Parse and validate the grid without delivering cells to any device
    pub validate_only: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_path: None,
            region_name: DEFAULT_REGION_NAME.to_string(),
            sinks: vec![SinkKind::Console],
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            include_column_header: false,
            store_location: None,
            compression: CompressionAlgorithm::default(),
            batch_size: STORE_WRITE_BATCH_SIZE,
            show_progress: false,
            validate_only: false,
        }
    }
}

impl RunConfig {
    /// Set the grid file to read
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the region name
    pub fn with_region_name(mut self, name: impl Into<String>) -> Self {
        self.region_name = name.into();
        self
    }

    /// Replace the active output devices
    pub fn with_sinks(mut self, sinks: Vec<SinkKind>) -> Self {
        self.sinks = sinks;
        self
    }

    /// Set the file sink destination
    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = path.into();
        self
    }

    /// Enable the file sink's column header line
    pub fn with_column_header(mut self) -> Self {
        self.include_column_header = true;
        self
    }

    /// Set the Parquet store directory
    pub fn with_store_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_location = Some(path.into());
        self
    }

    /// Set the Parquet store compression
    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Set the Parquet batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enable the progress bar
    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }

    /// Enable validate only mode
    pub fn with_validate_only(mut self) -> Self {
        self.validate_only = true;
        self
    }

    /// Devices that will actually receive cells
    pub fn active_sinks(&self) -> &[SinkKind] {
        if self.validate_only {
            &[]
        } else {
            self.sinks.as_slice()
        }
    }

    /// Check the configuration is complete and consistent
    pub fn validate(&self) -> Result<()> {
        if self.input_path.is_none() {
            return Err(GridError::configuration("no input file given"));
        }

        let sinks = self.active_sinks();
        if sinks.is_empty() && !self.validate_only {
            return Err(GridError::configuration("at least one output device is required"));
        }

        if sinks.contains(&SinkKind::File) && self.output_file.as_os_str().is_empty() {
            return Err(GridError::configuration(
                "the file device requires an output path",
            ));
        }

        if sinks.contains(&SinkKind::Store) {
            if self.store_location.is_none() {
                return Err(GridError::configuration(
                    "the store device requires a store location",
                ));
            }
            if self.region_name.trim().is_empty() {
                return Err(GridError::configuration(
                    "the store device requires a region name",
                ));
            }
            if !is_plain_file_stem(&self.region_name) {
                return Err(GridError::configuration(format!(
                    "region name '{}' cannot name a store table file",
                    self.region_name
                )));
            }
            if self.batch_size == 0 {
                return Err(GridError::configuration(
                    "batch size must be greater than zero",
                ));
            }
        }

        Ok(())
    }

    /// Construct the configured sinks in delivery order
    pub fn build_sinks(&self) -> Result<Vec<Box<dyn OutputSink>>> {
        self.validate()?;

        let mut sinks: Vec<Box<dyn OutputSink>> = Vec::with_capacity(self.sinks.len());
        for kind in self.active_sinks() {
            let sink: Box<dyn OutputSink> = match kind {
                SinkKind::Console => Box::new(ConsoleSink::stdout()),
                SinkKind::File => Box::new(
                    FileSink::new(&self.output_file).with_column_header(self.include_column_header),
                ),
                SinkKind::Store => {
                    let location = self
                        .store_location
                        .as_deref()
                        .ok_or_else(|| GridError::configuration("store location missing"))?;
                    let repository = ParquetRepository::create(
                        location,
                        &self.region_name,
                        self.compression,
                        self.batch_size,
                    )
                    .map_err(|source| GridError::SinkOpenFailed {
                        sink: kind.to_string(),
                        source,
                    })?;
                    Box::new(StoreSink::new(repository))
                }
            };
            debug!("Configured output device: {}", kind);
            sinks.push(sink);
        }

        Ok(sinks)
    }
}
