//! Human-readable cell display

use super::{OutputSink, SinkResult};
use crate::models::{Cell, Header};
use std::io::{self, Stdout, Write};

/// Prints the header summary and one line per cell
pub struct ConsoleSink<W: Write + Send = Stdout> {
    writer: W,
}

impl ConsoleSink<Stdout> {
    /// Console sink writing to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the sink and return the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> OutputSink for ConsoleSink<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn open(&mut self, header: &Header, has_nodata_value: bool) -> SinkResult {
        writeln!(self.writer, "esri header processed as:")?;
        writeln!(self.writer, "{}", header)?;
        if !has_nodata_value {
            writeln!(self.writer, "(nodata_value not present, using default)")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write(&mut self, cell: &Cell) -> SinkResult {
        writeln!(
            self.writer,
            "lat: {}, lon: {}, value: {}",
            cell.latitude as f32, cell.longitude as f32, cell.value
        )?;
        Ok(())
    }

    fn close(&mut self) -> SinkResult {
        self.writer.flush()?;
        Ok(())
    }
}
