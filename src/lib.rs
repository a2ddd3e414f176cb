//! ESRI Grid Processor Library
//!
//! Streams ESRI ASCII raster files as geocoordinate-tagged samples.
//!
//! This library provides tools for:
//! - Parsing and validating the keyed header, including the optional `nodata_value`
//! - Deriving per-cell latitude and longitude from the corner and cell size
//! - Streaming the data block row by row with strict width checks
//! - Delivering every cell to console, flat file and Parquet store outputs
//! - Orchestrating runs with cancellation and guaranteed output cleanup

pub mod config;
pub mod constants;
pub mod error;
pub mod grid;
pub mod header;
pub mod models;
pub mod processor;
pub mod sink;
pub mod source;
pub mod store;
pub mod transform;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::{CompressionAlgorithm, RunConfig, SinkKind};
pub use error::{ErrorStage, GridError, Result};
pub use models::{Cell, GridRow, Header, RunState, RunStats};
pub use processor::GridProcessor;
pub use sink::OutputSink;
