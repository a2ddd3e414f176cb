//! Core data structures for grid processing.
//!
//! Defines the validated header, the per-cell sample record, the row unit
//! produced by the streamer, and run statistics.

use crate::constants::DEFAULT_NODATA_VALUE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Validated ESRI ASCII header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Region name the grid is recorded under
    pub name: String,
    pub ncols: usize,
    pub nrows: usize,
    pub xllcorner: f64,
    pub yllcorner: f64,
    pub cellsize: f64,
    /// NODATA sentinel, -9999 when the header omits it
    pub nodata_value: f64,
}

impl Header {
    /// Total number of cells in the grid
    pub fn cell_count(&self) -> usize {
        self.ncols * self.nrows
    }

    /// Northern edge of the grid extent
    pub fn north_edge(&self) -> f64 {
        self.yllcorner + self.nrows as f64 * self.cellsize
    }

    /// Check if a value is the NODATA sentinel
    pub fn is_nodata(&self, value: f64) -> bool {
        value == self.nodata_value
    }
}

impl Default for Header {
    fn default() -> Self {
        Self {
            name: String::new(),
            ncols: 1,
            nrows: 1,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 1.0,
            nodata_value: DEFAULT_NODATA_VALUE,
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "name         {}", self.name)?;
        writeln!(f, "ncols        {}", self.ncols)?;
        writeln!(f, "nrows        {}", self.nrows)?;
        writeln!(f, "xllcorner    {}", self.xllcorner)?;
        writeln!(f, "yllcorner    {}", self.yllcorner)?;
        writeln!(f, "cellsize     {}", self.cellsize)?;
        write!(f, "nodata_value {}", self.nodata_value)
    }
}

/// One geocoordinate-tagged grid sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

/// One data row of the grid, in column order
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub index: usize,
    pub cells: Vec<Cell>,
}

/// Processor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Init,
    HeaderParsed,
    Streaming,
    Done,
    Failed,
}

/// Processing statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub rows_processed: usize,
    pub cells_emitted: usize,
    pub nodata_cells: usize,
    pub has_nodata_value: bool,
    pub sinks: Vec<String>,
    pub state: RunState,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
