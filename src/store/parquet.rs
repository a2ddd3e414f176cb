//! Parquet-backed repository
//!
//! Writes two tables per region under the store location:
//! `<region>_header.parquet` with one row per inserted header, and
//! `<region>_data.parquet` with one row per cell. Cells are buffered and
//! flushed in fixed-size batches through a polars batched writer, so memory
//! stays bounded by the batch size rather than the grid size.

use super::{CellRecord, HeaderRecord, Repository};
use crate::config::CompressionAlgorithm;
use crate::constants::{STORE_DATA_TABLE, STORE_HEADER_TABLE};
use crate::error::SinkError;
use polars::df;
use polars::io::parquet::write::BatchedWriter;
use polars::prelude::{DataFrame, ParquetWriter, PolarsResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Column buffers for cells awaiting a batch flush
#[derive(Debug, Default)]
struct CellBuffer {
    cell_ids: Vec<i64>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    values: Vec<f64>,
    header_ids: Vec<i64>,
}

impl CellBuffer {
    fn len(&self) -> usize {
        self.cell_ids.len()
    }

    fn push(&mut self, cell_id: i64, record: &CellRecord) {
        self.cell_ids.push(cell_id);
        self.latitudes.push(record.latitude);
        self.longitudes.push(record.longitude);
        self.values.push(record.value);
        self.header_ids.push(record.header_id);
    }

    /// Move buffered rows into a DataFrame, leaving the buffer empty
    fn take_frame(&mut self) -> PolarsResult<DataFrame> {
        let buffer = std::mem::take(self);
        df!(
            "cell_id" => buffer.cell_ids,
            "latitude" => buffer.latitudes,
            "longitude" => buffer.longitudes,
            "value" => buffer.values,
            "header_id" => buffer.header_ids
        )
    }
}

/// Repository writing header and cell tables as Parquet files
pub struct ParquetRepository {
    header_path: PathBuf,
    data_path: PathBuf,
    compression: CompressionAlgorithm,
    batch_size: usize,
    headers: Vec<(i64, HeaderRecord)>,
    buffer: CellBuffer,
    data_writer: Option<BatchedWriter<File>>,
    cells_written: usize,
    finished: bool,
}

impl ParquetRepository {
    /// Create a repository for `region` under the `location` directory
    pub fn create(
        location: &Path,
        region: &str,
        compression: CompressionAlgorithm,
        batch_size: usize,
    ) -> Result<Self, SinkError> {
        if batch_size == 0 {
            return Err("store batch size must be greater than zero".into());
        }
        fs::create_dir_all(location)?;

        Ok(Self {
            header_path: location.join(format!("{}_{}.parquet", region, STORE_HEADER_TABLE)),
            data_path: location.join(format!("{}_{}.parquet", region, STORE_DATA_TABLE)),
            compression,
            batch_size,
            headers: Vec::new(),
            buffer: CellBuffer::default(),
            data_writer: None,
            cells_written: 0,
            finished: false,
        })
    }

    pub fn header_path(&self) -> &Path {
        &self.header_path
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    fn write_header_table(&self) -> PolarsResult<()> {
        let mut frame = df!(
            "header_id" => self.headers.iter().map(|(id, _)| *id).collect::<Vec<i64>>(),
            "name" => self.headers.iter().map(|(_, h)| h.name.clone()).collect::<Vec<String>>(),
            "ncols" => self.headers.iter().map(|(_, h)| h.ncols as i64).collect::<Vec<i64>>(),
            "nrows" => self.headers.iter().map(|(_, h)| h.nrows as i64).collect::<Vec<i64>>(),
            "xllcorner" => self.headers.iter().map(|(_, h)| h.xllcorner).collect::<Vec<f64>>(),
            "yllcorner" => self.headers.iter().map(|(_, h)| h.yllcorner).collect::<Vec<f64>>(),
            "cellsize" => self.headers.iter().map(|(_, h)| h.cellsize).collect::<Vec<f64>>(),
            "nodata_value" => self.headers.iter().map(|(_, h)| h.nodata_value).collect::<Vec<f64>>(),
            "imported_at" => self.headers.iter().map(|(_, h)| h.imported_at.to_rfc3339()).collect::<Vec<String>>()
        )?;

        let file = File::create(&self.header_path)?;
        ParquetWriter::new(file)
            .with_compression(self.compression.to_polars_compression())
            .finish(&mut frame)?;
        Ok(())
    }

    fn flush_batch(&mut self) -> PolarsResult<()> {
        let frame = self.buffer.take_frame()?;
        let rows = frame.height();

        if self.data_writer.is_none() {
            let schema = frame.schema().clone();
            let file = File::create(&self.data_path)?;
            let writer = ParquetWriter::new(file)
                .with_compression(self.compression.to_polars_compression())
                .batched(&schema)?;
            self.data_writer = Some(writer);
        }

        if let Some(writer) = self.data_writer.as_mut() {
            writer.write_batch(&frame)?;
        }

        self.cells_written += rows;
        debug!(
            "Flushed {} cells to {} ({} total)",
            rows,
            self.data_path.display(),
            self.cells_written
        );
        Ok(())
    }
}

impl Repository for ParquetRepository {
    fn insert_header(&mut self, record: &HeaderRecord) -> Result<i64, SinkError> {
        let id = self.headers.len() as i64 + 1;
        self.headers.push((id, record.clone()));
        self.write_header_table()?;
        debug!("Stored header {} in {}", id, self.header_path.display());
        Ok(id)
    }

    fn insert_cell(&mut self, record: &CellRecord) -> Result<(), SinkError> {
        let cell_id = (self.cells_written + self.buffer.len()) as i64 + 1;
        self.buffer.push(cell_id, record);

        if self.buffer.len() >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        if self.buffer.len() > 0 || self.data_writer.is_none() {
            self.flush_batch()?;
        }
        if let Some(mut writer) = self.data_writer.take() {
            writer.finish()?;
        }

        debug!(
            "Finished Parquet store: {} cells in {}",
            self.cells_written,
            self.data_path.display()
        );
        Ok(())
    }
}

impl Drop for ParquetRepository {
    fn drop(&mut self) {
        if !self.finished && !self.headers.is_empty() {
            if let Err(e) = self.finish() {
                warn!("Failed to finalize Parquet store on drop: {}", e);
            }
        }
    }
}
