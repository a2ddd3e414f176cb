//! In-process repository

use super::{CellRecord, HeaderRecord, Repository};
use crate::error::SinkError;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct Tables {
    pub headers: Vec<(i64, HeaderRecord)>,
    pub cells: Vec<CellRecord>,
    pub finished: bool,
}

/// Keeps inserted rows in shared tables that stay readable after the run
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the tables, usable after the repository is moved into a sink
    pub fn tables(&self) -> Arc<Mutex<Tables>> {
        Arc::clone(&self.tables)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, SinkError> {
        self.tables
            .lock()
            .map_err(|_| SinkError::from("memory repository lock was poisoned"))
    }
}

impl Repository for MemoryRepository {
    fn insert_header(&mut self, record: &HeaderRecord) -> Result<i64, SinkError> {
        let mut tables = self.lock()?;
        let id = tables.headers.len() as i64 + 1;
        tables.headers.push((id, record.clone()));
        Ok(id)
    }

    fn insert_cell(&mut self, record: &CellRecord) -> Result<(), SinkError> {
        let mut tables = self.lock()?;
        if !tables.headers.iter().any(|(id, _)| *id == record.header_id) {
            return Err(format!("unknown header id {}", record.header_id).into());
        }
        tables.cells.push(*record);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.lock()?.finished = true;
        Ok(())
    }
}
