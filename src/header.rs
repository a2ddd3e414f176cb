//! ESRI ASCII header parsing and validation.
//!
//! Reads the fixed header block from the start of a [`LineSource`]: five
//! mandatory keyed lines in a fixed order followed by an optional
//! `nodata_value` line. When the optional line is missing, the line that was
//! read in its place is pushed back so the grid stage consumes it as data.

use crate::constants::{DEFAULT_NODATA_VALUE, MANDATORY_HEADER_LINES, header_keys};
use crate::error::{GridError, Result};
use crate::models::Header;
use crate::source::LineSource;
use std::io::BufRead;
use tracing::debug;

/// Parse the header block, returning the header and whether NODATA was present
pub fn parse_header<R: BufRead>(source: &mut LineSource<R>, name: &str) -> Result<(Header, bool)> {
    let mut values = HeaderValues::default();
    let mut has_nodata_value = true;

    for (slot, key) in header_keys::ORDERED.iter().enumerate() {
        let is_nodata_slot = *key == header_keys::NODATA_VALUE;

        let Some(line) = source.next_line()? else {
            if is_nodata_slot {
                has_nodata_value = false;
                break;
            }
            return Err(GridError::TruncatedHeader {
                expected: MANDATORY_HEADER_LINES,
                found: slot,
            });
        };
        let line_number = source.line_number();

        let mut tokens = line.split_whitespace();
        let parameter = tokens.next().map(str::to_lowercase);

        if parameter.as_deref() != Some(*key) {
            if is_nodata_slot {
                debug!(
                    "Line {} is not '{}', treating it as the first data row",
                    line_number, key
                );
                has_nodata_value = false;
                source.push_back(line);
                break;
            }
            return Err(GridError::missing_parameter(*key, line_number));
        }

        let value = parse_parameter_value(key, tokens, line_number)?;
        values.set(slot, value);
    }

    let header = values.build(name, has_nodata_value)?;

    debug!(
        "Parsed header: {}x{} cells, corner=({}, {}), cellsize={}, nodata={} (present: {})",
        header.ncols,
        header.nrows,
        header.xllcorner,
        header.yllcorner,
        header.cellsize,
        header.nodata_value,
        has_nodata_value
    );

    Ok((header, has_nodata_value))
}

/// Parse the single value token following a header key
fn parse_parameter_value<'a>(
    key: &str,
    mut tokens: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<f64> {
    let token = tokens.next().unwrap_or_default();

    let extra: Vec<&str> = tokens.collect();
    if !extra.is_empty() {
        return Err(GridError::malformed_value(
            key,
            format!("{} {}", token, extra.join(" ")),
            line,
        ));
    }

    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(GridError::malformed_value(key, token, line)),
    }
}

/// Raw header values collected slot by slot
#[derive(Debug, Default)]
struct HeaderValues {
    values: [Option<f64>; 6],
}

impl HeaderValues {
    fn set(&mut self, slot: usize, value: f64) {
        self.values[slot] = Some(value);
    }

    fn get(&self, slot: usize) -> f64 {
        self.values[slot].unwrap_or_default()
    }

    fn build(self, name: &str, has_nodata_value: bool) -> Result<Header> {
        let ncols = parse_dimension(header_keys::NCOLS, self.get(0), 1)?;
        let nrows = parse_dimension(header_keys::NROWS, self.get(1), 2)?;

        let cellsize = self.get(4);
        if cellsize <= 0.0 {
            return Err(GridError::malformed_value(
                header_keys::CELLSIZE,
                cellsize.to_string(),
                5,
            ));
        }

        let nodata_value = if has_nodata_value {
            self.get(5)
        } else {
            DEFAULT_NODATA_VALUE
        };

        Ok(Header {
            name: name.to_string(),
            ncols,
            nrows,
            xllcorner: self.get(2),
            yllcorner: self.get(3),
            cellsize,
            nodata_value,
        })
    }
}

/// Grid dimensions must be whole numbers of at least one cell
fn parse_dimension(key: &str, value: f64, line: usize) -> Result<usize> {
    if value < 1.0 || value.fract() != 0.0 || value > usize::MAX as f64 {
        return Err(GridError::malformed_value(key, value.to_string(), line));
    }
    Ok(value as usize)
}
