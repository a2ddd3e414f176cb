//! Row-by-row streaming of the grid data block.
//!
//! Continues reading the [`LineSource`] the header parser left positioned at
//! the first data line and yields one [`GridRow`] per declared row. Only the
//! current row is held in memory.

use crate::error::{GridError, Result};
use crate::models::{Cell, GridRow, Header};
use crate::source::LineSource;
use crate::transform;
use std::io::BufRead;
use tracing::{debug, warn};

/// Lazy, finite, non-restartable sequence of grid rows
#[derive(Debug)]
pub struct GridStreamer<'a, R> {
    source: LineSource<R>,
    header: &'a Header,
    next_row: usize,
    finished: bool,
}

impl<'a, R: BufRead> GridStreamer<'a, R> {
    /// Create a streamer over a source positioned immediately after the header
    pub fn new(source: LineSource<R>, header: &'a Header) -> Self {
        Self {
            source,
            header,
            next_row: 0,
            finished: false,
        }
    }

    /// Number of rows yielded so far
    pub fn rows_read(&self) -> usize {
        self.next_row
    }

    /// Read and validate the next row, `None` once all rows are consumed
    pub fn next_row(&mut self) -> Option<Result<GridRow>> {
        if self.finished {
            return None;
        }

        if self.next_row == self.header.nrows {
            self.finished = true;
            self.check_trailing_content();
            return None;
        }

        let result = self.read_row();
        match &result {
            Ok(_) => self.next_row += 1,
            Err(_) => self.finished = true,
        }
        Some(result)
    }

    fn read_row(&mut self) -> Result<GridRow> {
        let index = self.next_row;

        let next = self.source.next_line().map_err(|e| match e {
            GridError::Io(source) => GridError::DataReadFailed {
                row: index,
                line: self.source.line_number() + 1,
                source,
            },
            other => other,
        })?;
        let Some(line) = next else {
            return Err(GridError::TruncatedData {
                expected_rows: self.header.nrows,
                found_rows: index,
            });
        };
        let line_number = self.source.line_number();

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != self.header.ncols {
            return Err(GridError::RowWidthMismatch {
                expected: self.header.ncols,
                actual: tokens.len(),
                row: index,
            });
        }

        let latitude = transform::latitude(self.header, index);
        let mut cells = Vec::with_capacity(self.header.ncols);

        for (col, token) in tokens.iter().enumerate() {
            let value = token.parse::<f64>().map_err(|_| {
                GridError::malformed_value(format!("cell[{},{}]", index, col), *token, line_number)
            })?;

            cells.push(Cell {
                row: index,
                col,
                latitude,
                longitude: transform::longitude(self.header, col),
                value,
            });
        }

        debug!("Read row {} ({} cells) from line {}", index, cells.len(), line_number);

        Ok(GridRow { index, cells })
    }

    /// Lines after the last declared row are ignored, but flagged if non-blank
    fn check_trailing_content(&mut self) {
        match self.source.next_line() {
            Ok(Some(line)) if !line.trim().is_empty() => warn!(
                "Ignoring content after the last declared row (line {})",
                self.source.line_number()
            ),
            Ok(_) => {}
            Err(e) => warn!(
                "Ignoring unreadable content after the last declared row (line {}): {}",
                self.source.line_number() + 1,
                e
            ),
        }
    }
}

impl<R: BufRead> Iterator for GridStreamer<'_, R> {
    type Item = Result<GridRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::parse_header;
    use std::io::Cursor;

    fn stream(content: &str) -> (Header, Vec<Result<GridRow>>) {
        let mut source = LineSource::new(Cursor::new(content.to_string()));
        let (header, _) = parse_header(&mut source, "test").unwrap();
        let rows = GridStreamer::new(source, &header).collect();
        (header, rows)
    }

    #[test]
    fn test_streams_cells_in_row_major_order() {
        let (header, rows) = stream(
            "ncols 3\nnrows 2\nxllcorner 10\nyllcorner 20\ncellsize 1\nnodata_value -9999\n1 2 3\n4 5 6\n",
        );

        let cells: Vec<Cell> = rows
            .into_iter()
            .map(|r| r.unwrap())
            .flat_map(|r| r.cells)
            .collect();

        assert_eq!(cells.len(), header.cell_count());
        let positions: Vec<(usize, usize)> = cells.iter().map(|c| (c.row, c.col)).collect();
        assert_eq!(positions, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);

        let values: Vec<f64> = cells.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert_eq!(cells[0].latitude, 21.0);
        assert_eq!(cells[0].longitude, 10.0);
        assert_eq!(cells[5].latitude, 20.0);
        assert_eq!(cells[5].longitude, 12.0);
    }

    #[test]
    fn test_first_row_read_from_pushed_back_line() {
        let (_, rows) = stream("ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n7 8\n9 10\n");

        let rows: Vec<GridRow> = rows.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells[0].value, 7.0);
        assert_eq!(rows[1].cells[1].value, 10.0);
    }

    #[test]
    fn test_trailing_separator_is_discounted() {
        let (_, rows) = stream("ncols 3\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n 1 2 3 \n");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_ref().unwrap().cells.len(), 3);
    }

    #[test]
    fn test_short_row_fails_with_row_index() {
        let (_, rows) = stream("ncols 3\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n4 5\n");

        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_ok());
        match rows[1].as_ref().unwrap_err() {
            GridError::RowWidthMismatch {
                expected,
                actual,
                row,
            } => {
                assert_eq!(*expected, 3);
                assert_eq!(*actual, 2);
                assert_eq!(*row, 1);
            }
            other => panic!("Expected RowWidthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_long_row_fails() {
        let (_, rows) = stream("ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n");

        assert!(matches!(
            rows[0],
            Err(GridError::RowWidthMismatch {
                expected: 2,
                actual: 3,
                row: 0
            })
        ));
    }

    #[test]
    fn test_non_numeric_cell_fails() {
        let (_, rows) = stream("ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 abc\n");

        match rows[0].as_ref().unwrap_err() {
            GridError::MalformedValue { field, token, line } => {
                assert_eq!(field, "cell[0,1]");
                assert_eq!(token, "abc");
                assert_eq!(*line, 6);
            }
            other => panic!("Expected MalformedValue, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_rows_fail() {
        let (_, rows) = stream("ncols 1\nnrows 3\nxllcorner 0\nyllcorner 0\ncellsize 1\n1\n");

        assert_eq!(rows.len(), 2);
        assert!(matches!(
            rows[1],
            Err(GridError::TruncatedData {
                expected_rows: 3,
                found_rows: 1
            })
        ));
    }

    #[test]
    fn test_stream_is_fused_after_error() {
        let mut source = LineSource::new(Cursor::new(
            "ncols 2\nnrows 3\nxllcorner 0\nyllcorner 0\ncellsize 1\n1\n2 3\n4 5\n".to_string(),
        ));
        let (header, _) = parse_header(&mut source, "test").unwrap();
        let mut streamer = GridStreamer::new(source, &header);

        assert!(streamer.next().unwrap().is_err());
        assert!(streamer.next().is_none());
        assert_eq!(streamer.rows_read(), 0);
    }

    #[test]
    fn test_content_after_last_row_is_ignored() {
        let (_, rows) = stream("ncols 1\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n1\n2\n");

        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_ok());
    }

    fn stream_bytes(content: &[u8]) -> Vec<Result<GridRow>> {
        let mut source = LineSource::new(Cursor::new(content.to_vec()));
        let (header, _) = parse_header(&mut source, "test").unwrap();
        GridStreamer::new(source, &header).collect()
    }

    #[test]
    fn test_unreadable_trailing_bytes_are_ignored() {
        let rows = stream_bytes(b"ncols 1\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n1\n\xff\xfe junk\n");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_ref().unwrap().cells[0].value, 1.0);
    }

    #[test]
    fn test_unreadable_data_row_reports_row_and_line() {
        let rows = stream_bytes(b"ncols 1\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1\n\xff\xfe\n");

        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_ok());
        let err = rows[1].as_ref().unwrap_err();
        assert!(
            matches!(err, GridError::DataReadFailed { row: 1, line: 7, .. }),
            "Expected DataReadFailed, got {:?}",
            err
        );
        assert_eq!(err.stage(), crate::error::ErrorStage::Data);
    }
}
