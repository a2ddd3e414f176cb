//! Scenario tests for the processor
//!
//! Sinks here record every call in a shared event log so tests can check
//! exactly what each device saw and in which order.


use crate::config::RunConfig;
use crate::error::SinkError;
use crate::models::{Cell, Header};
use crate::sink::{OutputSink, SinkResult};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// 2x2 grid with a NODATA line and one NODATA cell
pub const GRID_2X2: &str = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\nNODATA_value -9999\n1 2\n3 -9999\n";

/// 3x2 grid without a NODATA line
pub const GRID_3X2_NO_NODATA: &str =
    "NCOLS 3\nNROWS 2\nXLLCORNER 10\nYLLCORNER 20\nCELLSIZE 0.5\n1 2 3\n4 5 6\n";

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Open { header: Header, has_nodata: bool },
    Write(Cell),
    Close,
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// Test sink recording its lifecycle, with optional injected failures
pub struct RecordingSink {
    name: String,
    events: EventLog,
    fail_open: bool,
    fail_write_at: Option<usize>,
    fail_close: bool,
    cancel_after: Option<(usize, CancellationToken)>,
    writes: usize,
}

impl RecordingSink {
    pub fn new(name: &str) -> (Self, EventLog) {
        let events = EventLog::default();
        let sink = Self {
            name: name.to_string(),
            events: Arc::clone(&events),
            fail_open: false,
            fail_write_at: None,
            fail_close: false,
            cancel_after: None,
            writes: 0,
        };
        (sink, events)
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Fail on the n-th write (0-based)
    pub fn failing_write_at(mut self, n: usize) -> Self {
        self.fail_write_at = Some(n);
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Cancel `token` once `n` cells have been written
    pub fn cancelling_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    pub fn boxed(self) -> Box<dyn OutputSink> {
        Box::new(self)
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl OutputSink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self, header: &Header, has_nodata_value: bool) -> SinkResult {
        if self.fail_open {
            return Err(SinkError::from("open refused"));
        }
        self.record(Event::Open {
            header: header.clone(),
            has_nodata: has_nodata_value,
        });
        Ok(())
    }

    fn write(&mut self, cell: &Cell) -> SinkResult {
        if self.fail_write_at == Some(self.writes) {
            return Err(SinkError::from("write refused"));
        }
        self.record(Event::Write(*cell));
        self.writes += 1;
        if let Some((n, token)) = &self.cancel_after {
            if self.writes == *n {
                token.cancel();
            }
        }
        Ok(())
    }

    fn close(&mut self) -> SinkResult {
        self.record(Event::Close);
        if self.fail_close {
            return Err(SinkError::from("close refused"));
        }
        Ok(())
    }
}

/// Cells written in order
pub fn written_cells(events: &EventLog) -> Vec<Cell> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            Event::Write(cell) => Some(*cell),
            _ => None,
        })
        .collect()
}

/// Number of close calls recorded
pub fn close_count(events: &EventLog) -> usize {
    events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, Event::Close))
        .count()
}

pub fn test_config() -> RunConfig {
    RunConfig::default()
        .with_input("unused.asc")
        .with_region_name("test_region")
}
