//! Repository interface for persisting grids
//!
//! The store sink never knows how records are persisted. It is handed a
//! [`Repository`] and issues one header insert per run followed by one cell
//! insert per grid position, each cell referencing the header by the
//! identifier the repository returned.
//!
//! - [`memory`] - in-process tables, used for inspection and tests
//! - [`parquet`] - header and cell tables written as Parquet files

pub mod memory;
pub mod parquet;

pub use memory::MemoryRepository;
pub use parquet::ParquetRepository;

use crate::error::SinkError;
use crate::models::Header;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Header row: region name plus the six grid parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderRecord {
    pub name: String,
    pub ncols: usize,
    pub nrows: usize,
    pub xllcorner: f64,
    pub yllcorner: f64,
    pub cellsize: f64,
    pub nodata_value: f64,
    pub imported_at: DateTime<Utc>,
}

impl HeaderRecord {
    pub fn from_header(header: &Header) -> Self {
        Self {
            name: header.name.clone(),
            ncols: header.ncols,
            nrows: header.nrows,
            xllcorner: header.xllcorner,
            yllcorner: header.yllcorner,
            cellsize: header.cellsize,
            nodata_value: header.nodata_value,
            imported_at: Utc::now(),
        }
    }
}

/// Cell row referencing its header
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
    pub header_id: i64,
}

/// Insert interface handed to the store sink
pub trait Repository: Send {
    /// Insert the header row and return its identifier
    fn insert_header(&mut self, record: &HeaderRecord) -> Result<i64, SinkError>;

    /// Insert one cell row
    fn insert_cell(&mut self, record: &CellRecord) -> Result<(), SinkError>;

    /// Persist anything still buffered and release held resources
    fn finish(&mut self) -> Result<(), SinkError>;
}
