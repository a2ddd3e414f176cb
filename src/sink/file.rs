//! Flat file output, one `lat,lon,value` line per cell

use super::{OutputSink, SinkResult, format_cell_record};
use crate::constants::FILE_COLUMN_HEADER;
use crate::models::{Cell, Header};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

/// Writes cell records to a file, truncating any previous content on open
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    include_column_header: bool,
    writer: Option<BufWriter<File>>,
    lines_written: usize,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            include_column_header: false,
            writer: None,
            lines_written: 0,
        }
    }

    /// Write a `latitude,longitude,value` line before the first record
    pub fn with_column_header(mut self, include: bool) -> Self {
        self.include_column_header = include;
        self
    }

    fn writer(&mut self) -> std::result::Result<&mut BufWriter<File>, std::io::Error> {
        self.writer.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotConnected, "file sink is not open")
        })
    }
}

impl OutputSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn open(&mut self, _header: &Header, _has_nodata_value: bool) -> SinkResult {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        if self.include_column_header {
            writeln!(writer, "{}", FILE_COLUMN_HEADER)?;
        }

        debug!("Opened file sink at {}", self.path.display());
        self.writer = Some(writer);
        self.lines_written = 0;
        Ok(())
    }

    fn write(&mut self, cell: &Cell) -> SinkResult {
        let record = format_cell_record(cell);
        writeln!(self.writer()?, "{}", record)?;
        self.lines_written += 1;
        Ok(())
    }

    fn close(&mut self) -> SinkResult {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            debug!(
                "Closed file sink at {} ({} records)",
                self.path.display(),
                self.lines_written
            );
        }
        Ok(())
    }
}
