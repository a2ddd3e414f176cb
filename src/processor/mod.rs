//! Run orchestration.
//!
//! [`GridProcessor`] wires the header parser, the grid streamer and the
//! configured sinks together for one input. It owns the run state machine
//! (`Init -> HeaderParsed -> Streaming -> Done`, or `Failed` from any state),
//! checks for cancellation between rows, and closes every sink it opened on
//! every exit path.

pub mod progress;

#[cfg(test)]
pub mod tests;

use self::progress::ProgressReporter;

use crate::config::RunConfig;
use crate::error::{GridError, Result};
use crate::grid::GridStreamer;
use crate::header::parse_header;
use crate::models::{Header, RunState, RunStats};
use crate::sink::OutputSink;
use crate::source::LineSource;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives one grid through the active sinks
pub struct GridProcessor {
    config: RunConfig,
    sinks: Vec<Box<dyn OutputSink>>,
    cancellation: CancellationToken,
    progress: ProgressReporter,
    state: RunState,
}

impl GridProcessor {
    /// Create a processor with the sinks named by the configuration
    pub fn new(config: RunConfig) -> Result<Self> {
        let sinks = config.build_sinks()?;
        Ok(Self::with_sinks(config, sinks))
    }

    /// Create a processor delivering to the given sinks
    pub fn with_sinks(config: RunConfig, sinks: Vec<Box<dyn OutputSink>>) -> Self {
        Self {
            config,
            sinks,
            cancellation: CancellationToken::new(),
            progress: ProgressReporter::new(),
            state: RunState::Init,
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Token that stops the run before the next row when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Names of the sinks in delivery order
    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_string()).collect()
    }

    /// Process the configured input file
    pub fn process(&mut self) -> Result<RunStats> {
        let path = self
            .config
            .input_path
            .clone()
            .ok_or_else(|| GridError::configuration("no input file given"))?;
        self.process_path(&path)
    }

    /// Process the grid file at `path`
    pub fn process_path(&mut self, path: &Path) -> Result<RunStats> {
        info!("Processing grid file: {}", path.display());
        let file = File::open(path).map_err(|e| {
            self.state = RunState::Failed;
            GridError::input_unavailable(path, e)
        })?;
        self.process_reader(BufReader::new(file))
    }

    /// Process a grid read from any buffered source
    pub fn process_reader<R: BufRead>(&mut self, reader: R) -> Result<RunStats> {
        let start_time = Instant::now();
        self.state = RunState::Init;
        self.progress = ProgressReporter::new();

        let mut stats = RunStats {
            sinks: self.sink_names(),
            ..Default::default()
        };

        let result = self.run(reader, &mut stats);
        stats.elapsed = start_time.elapsed();

        match result {
            Ok(()) => {
                self.transition(RunState::Done);
                stats.state = RunState::Done;
                self.progress.finish(stats.cells_emitted);
                info!(
                    "Processed {} rows ({} cells) in {:.2?}",
                    stats.rows_processed, stats.cells_emitted, stats.elapsed
                );
                Ok(stats)
            }
            Err(e) => {
                self.transition(RunState::Failed);
                self.progress.finish_with_error(&e.to_string());
                if e.is_cancelled() {
                    warn!("{}", e);
                } else {
                    error!("Run failed during {} stage: {}", e.stage(), e);
                }
                Err(e)
            }
        }
    }

    fn run<R: BufRead>(&mut self, reader: R, stats: &mut RunStats) -> Result<()> {
        let mut source = LineSource::new(reader);
        let (header, has_nodata_value) = parse_header(&mut source, &self.config.region_name)?;
        self.transition(RunState::HeaderParsed);
        info!(
            "Header parsed: {}x{} grid, cellsize {}, nodata {}{}",
            header.ncols,
            header.nrows,
            header.cellsize,
            header.nodata_value,
            if has_nodata_value { "" } else { " (default)" }
        );
        stats.has_nodata_value = has_nodata_value;

        self.open_sinks(&header, has_nodata_value)?;
        self.transition(RunState::Streaming);
        if self.config.show_progress {
            self.progress.setup_progress(header.nrows, &header.name);
        }

        if let Err(e) = self.stream(source, &header, stats) {
            self.close_after_error(self.sinks.len());
            return Err(e);
        }
        self.close_sinks()
    }

    fn stream<R: BufRead>(
        &mut self,
        source: LineSource<R>,
        header: &Header,
        stats: &mut RunStats,
    ) -> Result<()> {
        let mut streamer = GridStreamer::new(source, header);

        loop {
            if stats.rows_processed < header.nrows && self.cancellation.is_cancelled() {
                return Err(GridError::Cancelled {
                    rows_completed: stats.rows_processed,
                });
            }

            let row = match streamer.next_row() {
                Some(row) => row?,
                None => break,
            };

            for cell in &row.cells {
                if header.is_nodata(cell.value) {
                    stats.nodata_cells += 1;
                }
                for sink in self.sinks.iter_mut() {
                    sink.write(cell)
                        .map_err(|source| GridError::SinkWriteFailed {
                            sink: sink.name().to_string(),
                            row: cell.row,
                            col: cell.col,
                            source,
                        })?;
                }
                stats.cells_emitted += 1;
            }

            stats.rows_processed += 1;
            self.progress.row_completed();
            debug!("Row {} delivered to {} sinks", row.index, self.sinks.len());
        }

        Ok(())
    }

    /// Open every sink in order, closing the already opened ones on failure
    fn open_sinks(&mut self, header: &Header, has_nodata_value: bool) -> Result<()> {
        for index in 0..self.sinks.len() {
            let sink = &mut self.sinks[index];
            if let Err(source) = sink.open(header, has_nodata_value) {
                let name = sink.name().to_string();
                self.close_after_error(index);
                return Err(GridError::SinkOpenFailed { sink: name, source });
            }
            debug!("Opened sink '{}'", sink.name());
        }
        Ok(())
    }

    /// Close every sink after a successful stream
    ///
    /// Every sink is attempted and the first close failure is returned.
    fn close_sinks(&mut self) -> Result<()> {
        let mut first_error = None;

        for sink in self.sinks.iter_mut() {
            match sink.close() {
                Ok(()) => debug!("Closed sink '{}'", sink.name()),
                Err(source) => {
                    warn!("Sink '{}' failed to close: {}", sink.name(), source);
                    if first_error.is_none() {
                        first_error = Some(GridError::SinkCloseFailed {
                            sink: sink.name().to_string(),
                            source,
                        });
                    }
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Close the first `count` sinks once a primary error is already known
    ///
    /// Close failures are logged and do not replace the primary error.
    fn close_after_error(&mut self, count: usize) {
        for sink in self.sinks.iter_mut().take(count) {
            match sink.close() {
                Ok(()) => debug!("Closed sink '{}' after error", sink.name()),
                Err(source) => warn!("Sink '{}' failed to close: {}", sink.name(), source),
            }
        }
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
