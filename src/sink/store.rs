//! Store sink inserting header and cell records through a repository

use super::{OutputSink, SinkResult};
use crate::models::{Cell, Header};
use crate::store::{CellRecord, HeaderRecord, Repository};
use tracing::debug;

/// Persists one header row and one row per cell referencing it
pub struct StoreSink<R: Repository> {
    repository: R,
    header_id: Option<i64>,
}

impl<R: Repository> StoreSink<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            header_id: None,
        }
    }

    /// Identifier assigned to this run's header, once opened
    pub fn header_id(&self) -> Option<i64> {
        self.header_id
    }
}

impl<R: Repository> OutputSink for StoreSink<R> {
    fn name(&self) -> &str {
        "store"
    }

    fn open(&mut self, header: &Header, _has_nodata_value: bool) -> SinkResult {
        let id = self
            .repository
            .insert_header(&HeaderRecord::from_header(header))?;
        debug!("Store assigned header id {} to region '{}'", id, header.name);
        self.header_id = Some(id);
        Ok(())
    }

    fn write(&mut self, cell: &Cell) -> SinkResult {
        let header_id = self.header_id.ok_or("store sink is not open")?;
        self.repository.insert_cell(&CellRecord {
            latitude: cell.latitude,
            longitude: cell.longitude,
            value: cell.value,
            header_id,
        })
    }

    fn close(&mut self) -> SinkResult {
        self.repository.finish()
    }
}
