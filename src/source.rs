//! Forward-only line reading shared by the header and grid stages.
//!
//! The header parser may read one line that turns out to belong to the data
//! block (when `nodata_value` is absent). That line is pushed back here so
//! the grid stage sees it first, keeping the whole run to a single pass
//! over one open source.

use crate::error::Result;
use std::io::BufRead;

/// Line reader with a single push-back slot and a 1-based line counter
#[derive(Debug)]
pub struct LineSource<R> {
    reader: R,
    pending: Option<String>,
    line_number: usize,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: None,
            line_number: 0,
        }
    }

    /// Read the next line without its line terminator, `None` at end of input
    pub fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            self.line_number += 1;
            return Ok(Some(line));
        }

        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line)?;
        if bytes == 0 {
            return Ok(None);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        self.line_number += 1;
        Ok(Some(line))
    }

    /// Return a line to the source so the next read yields it again
    pub fn push_back(&mut self, line: String) {
        debug_assert!(self.pending.is_none(), "only one line can be pushed back");
        self.pending = Some(line);
        self.line_number -= 1;
    }

    /// Number of the most recently read line (0 before the first read)
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}
