//! Application constants for the ESRI grid processor
//!
//! Header keys, format defaults, and sink defaults shared by the parser,
//! the sinks, and the CLI.

// =============================================================================
// ESRI ASCII Header Format
// =============================================================================

/// Header keys in the order they must appear in the file
pub mod header_keys {
    pub const NCOLS: &str = "ncols";
    pub const NROWS: &str = "nrows";
    pub const XLLCORNER: &str = "xllcorner";
    pub const YLLCORNER: &str = "yllcorner";
    pub const CELLSIZE: &str = "cellsize";
    pub const NODATA_VALUE: &str = "nodata_value";

    /// Header slots, mandatory keys first, optional NODATA last
    pub const ORDERED: &[&str] = &[NCOLS, NROWS, XLLCORNER, YLLCORNER, CELLSIZE, NODATA_VALUE];
}

/// Number of header lines that must always be present
pub const MANDATORY_HEADER_LINES: usize = 5;

/// NODATA sentinel used when the header omits `nodata_value`
pub const DEFAULT_NODATA_VALUE: f64 = -9999.0;

// =============================================================================
// Sink Defaults
// =============================================================================

/// Default output devices when none are specified
pub const DEFAULT_DEVICES: &str = "con";

/// Default file sink output path
pub const DEFAULT_OUTPUT_FILE: &str = "/tmp/file.out";

/// Default region name recorded with the header
pub const DEFAULT_REGION_NAME: &str = "region";

/// Column header line written by the file sink when enabled
pub const FILE_COLUMN_HEADER: &str = "latitude,longitude,value";

// =============================================================================
// Store Configuration
// =============================================================================

/// Suffix of the header table file written by the Parquet store
pub const STORE_HEADER_TABLE: &str = "header";

/// Suffix of the cell table file written by the Parquet store
pub const STORE_DATA_TABLE: &str = "data";

/// Cells buffered before the Parquet store flushes a batch
pub const STORE_WRITE_BATCH_SIZE: usize = 65_536;

// =============================================================================
// Processing
// =============================================================================

/// Exit code used when a run is interrupted with Ctrl+C
pub const EXIT_CODE_INTERRUPTED: i32 = 130;
