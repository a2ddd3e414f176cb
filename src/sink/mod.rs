//! Output sinks for streamed grid cells
//!
//! A sink receives the full lifecycle of one run: [`OutputSink::open`] with
//! the validated header, [`OutputSink::write`] for every cell in row-major
//! order, then [`OutputSink::close`] exactly once. The processor drives a list
//! of boxed sinks uniformly, so adding a sink needs no change to streaming.
//!
//! ## Sinks
//!
//! - [`console`] - human-readable display on stdout (or any writer)
//! - [`file`] - one comma-separated line per cell in a flat file
//! - [`store`] - header and cell records inserted through a [`crate::store::Repository`]

pub mod console;
pub mod file;
pub mod store;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use store::StoreSink;

use crate::error::SinkError;
use crate::models::{Cell, Header};

/// Result type returned by sink operations
pub type SinkResult = std::result::Result<(), SinkError>;

/// Capability consumed by the processor for each active output device
pub trait OutputSink: Send {
    /// Short name used in logs and error reports
    fn name(&self) -> &str;

    /// Prepare the sink for a run of the given grid
    fn open(&mut self, header: &Header, has_nodata_value: bool) -> SinkResult;

    /// Deliver one cell; cells arrive in emission order
    fn write(&mut self, cell: &Cell) -> SinkResult;

    /// Release any resource held by the sink
    fn close(&mut self) -> SinkResult;
}

/// Render a cell as `lat,lon,value` with coordinates at single precision
pub fn format_cell_record(cell: &Cell) -> String {
    format!(
        "{},{},{}",
        cell.latitude as f32, cell.longitude as f32, cell.value
    )
}
