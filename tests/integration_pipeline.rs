//! End-to-end tests for the grid pipeline
//!
//! These tests write real grid files to a temporary directory and run them
//! through the processor with the file and Parquet store devices, checking
//! the produced artifacts rather than in-memory state.

use esri_grid_processor::config::{CompressionAlgorithm, RunConfig, SinkKind};
use esri_grid_processor::sink::{ConsoleSink, OutputSink, StoreSink};
use esri_grid_processor::store::MemoryRepository;
use esri_grid_processor::{ErrorStage, GridError, GridProcessor, RunState};
use polars::prelude::{DataFrame, ParquetReader, SerReader};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SMALL_GRID: &str = "\
ncols 2
nrows 2
xllcorner 0
yllcorner 0
cellsize 1
NODATA_value -9999
1 2
3 -9999
";

/// Sample mountain region tile without a nodata line, rows ending with a separator
const TILE_WITHOUT_NODATA: &str = "\
ncols        4
nrows        3
xllcorner    7.5
yllcorner    46.0
cellsize     0.25
1203.5 1210.0 1198.25 1187.0
1220.0 1231.5 1240.0 1236.75
1244.0 1250.5 1262.0 1270.25
";

fn write_grid(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn read_frame(path: &Path) -> DataFrame {
    ParquetReader::new(File::open(path).unwrap()).finish().unwrap()
}

#[test]
fn test_file_device_small_grid() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_grid(&temp_dir, "small.asc", SMALL_GRID);
    let output = temp_dir.path().join("small.out");

    let config = RunConfig::default()
        .with_input(&input)
        .with_sinks(vec![SinkKind::File])
        .with_output_file(&output);
    let mut processor = GridProcessor::new(config).unwrap();
    let stats = processor.process().unwrap();

    assert_eq!(stats.state, RunState::Done);
    assert_eq!(stats.cells_emitted, 4);
    assert_eq!(stats.nodata_cells, 1);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "1,0,1\n1,1,2\n0,0,3\n0,1,-9999\n"
    );
}

#[test]
fn test_file_device_tile_without_nodata() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_grid(&temp_dir, "tile.asc", TILE_WITHOUT_NODATA);
    let output = temp_dir.path().join("out").join("tile.csv");

    let config = RunConfig::default()
        .with_input(&input)
        .with_sinks(vec![SinkKind::File])
        .with_output_file(&output)
        .with_column_header();
    let stats = GridProcessor::new(config).unwrap().process().unwrap();

    assert!(!stats.has_nodata_value);
    assert_eq!(stats.rows_processed, 3);

    let content = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1 + 12);
    assert_eq!(lines[0], "latitude,longitude,value");
    // North-west corner: 46.0 + 3 * 0.25 - 0.25
    assert_eq!(lines[1], "46.5,7.5,1203.5");
    // South-east corner
    assert_eq!(lines[12], "46,8.25,1270.25");
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_grid(&temp_dir, "tile.asc", TILE_WITHOUT_NODATA);
    let output = temp_dir.path().join("tile.out");

    let config = RunConfig::default()
        .with_input(&input)
        .with_sinks(vec![SinkKind::File])
        .with_output_file(&output);

    GridProcessor::new(config.clone()).unwrap().process().unwrap();
    let first = fs::read(&output).unwrap();
    GridProcessor::new(config).unwrap().process().unwrap();
    let second = fs::read(&output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_parquet_store_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_grid(&temp_dir, "tile.asc", TILE_WITHOUT_NODATA);
    let store = temp_dir.path().join("store");

    let config = RunConfig::default()
        .with_input(&input)
        .with_region_name("alps")
        .with_sinks(vec![SinkKind::Store])
        .with_store_location(&store)
        .with_compression(CompressionAlgorithm::Zstd)
        .with_batch_size(5);
    let stats = GridProcessor::new(config).unwrap().process().unwrap();
    assert_eq!(stats.sinks, vec!["store".to_string()]);

    let headers = read_frame(&store.join("alps_header.parquet"));
    assert_eq!(headers.height(), 1);

    let data = read_frame(&store.join("alps_data.parquet"));
    assert_eq!(data.height(), 12);
    let names: Vec<String> = data
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(
        names,
        vec!["cell_id", "latitude", "longitude", "value", "header_id"]
    );
}

#[test]
fn test_store_and_file_devices_agree() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_grid(&temp_dir, "small.asc", SMALL_GRID);

    let repository = MemoryRepository::new();
    let tables = repository.tables();
    let sinks: Vec<Box<dyn OutputSink>> = vec![
        Box::new(StoreSink::new(repository)),
        Box::new(ConsoleSink::new(Vec::new())),
    ];

    let config = RunConfig::default().with_input(&input).with_region_name("small");
    let stats = GridProcessor::with_sinks(config, sinks).process().unwrap();
    assert_eq!(stats.cells_emitted, 4);

    let tables = tables.lock().unwrap();
    assert_eq!(tables.headers.len(), 1);
    assert_eq!(tables.headers[0].1.name, "small");
    assert_eq!(tables.headers[0].1.nodata_value, -9999.0);
    let cells: Vec<(f64, f64, f64)> = tables
        .cells
        .iter()
        .map(|c| (c.latitude, c.longitude, c.value))
        .collect();
    assert_eq!(
        cells,
        vec![
            (1.0, 0.0, 1.0),
            (1.0, 1.0, 2.0),
            (0.0, 0.0, 3.0),
            (0.0, 1.0, -9999.0)
        ]
    );
    assert!(tables.finished);
}

#[test]
fn test_malformed_header_reports_line() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_grid(
        &temp_dir,
        "bad.asc",
        "ncols 2\nnrows two\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2\n3 4\n",
    );
    let output = temp_dir.path().join("bad.out");

    let config = RunConfig::default()
        .with_input(&input)
        .with_sinks(vec![SinkKind::File])
        .with_output_file(&output);
    let err = GridProcessor::new(config).unwrap().process().unwrap_err();

    match &err {
        GridError::MalformedValue { field, token, line } => {
            assert_eq!(field, "nrows");
            assert_eq!(token, "two");
            assert_eq!(*line, 2);
        }
        other => panic!("Expected MalformedValue, got {:?}", other),
    }
    assert_eq!(err.stage(), ErrorStage::Header);
    assert!(!output.exists());
}

#[test]
fn test_wrong_row_width_in_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_grid(
        &temp_dir,
        "wide.asc",
        "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2\n3 4 5\n",
    );

    let config = RunConfig::default().with_input(&input).with_validate_only();
    let err = GridProcessor::new(config).unwrap().process().unwrap_err();

    assert!(matches!(
        err,
        GridError::RowWidthMismatch {
            expected: 2,
            actual: 3,
            row: 1
        }
    ));
}

#[test]
fn test_store_requires_location() {
    let config = RunConfig::default()
        .with_input("grid.asc")
        .with_sinks(vec![SinkKind::Store]);

    assert!(matches!(
        GridProcessor::new(config),
        Err(GridError::Configuration { .. })
    ));
}
