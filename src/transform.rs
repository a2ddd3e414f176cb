//! Grid position to geocoordinate mapping.
//!
//! The first data row is the northern edge of the grid: latitude drops by
//! one cellsize per row descended, longitude grows by one cellsize per
//! column from the western edge.

use crate::models::Header;

/// Latitude of a zero-based row
pub fn latitude(header: &Header, row: usize) -> f64 {
    header.north_edge() - (row + 1) as f64 * header.cellsize
}

/// Longitude of a zero-based column
pub fn longitude(header: &Header, col: usize) -> f64 {
    header.xllcorner + col as f64 * header.cellsize
}

/// `(latitude, longitude)` of a grid position
pub fn coordinates(header: &Header, row: usize, col: usize) -> (f64, f64) {
    (latitude(header, row), longitude(header, col))
}
