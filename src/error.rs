//! Error handling for grid processing operations.
//!
//! Every failure carries the stage it happened in (input, header, data
//! block, sink) together with the offending token, line, or row so the
//! caller can report exactly where a run stopped.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by sink and repository implementations
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Input unavailable: {path} - {source}")]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Truncated header: expected {expected} header lines, found {found}")]
    TruncatedHeader { expected: usize, found: usize },

    #[error("Missing header parameter '{name}' at line {line}")]
    MissingParameter { name: String, line: usize },

    #[error("Malformed value for {field} at line {line}: '{token}'")]
    MalformedValue {
        field: String,
        token: String,
        line: usize,
    },

    #[error("Row width mismatch in row {row}: expected {expected} columns, found {actual}")]
    RowWidthMismatch {
        expected: usize,
        actual: usize,
        row: usize,
    },

    #[error("Failed to read data row {row} at line {line}: {source}")]
    DataReadFailed {
        row: usize,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Truncated data block: expected {expected_rows} rows, found {found_rows}")]
    TruncatedData {
        expected_rows: usize,
        found_rows: usize,
    },

    #[error("Sink '{sink}' failed to open: {source}")]
    SinkOpenFailed {
        sink: String,
        #[source]
        source: SinkError,
    },

    #[error("Sink '{sink}' failed to write cell (row {row}, col {col}): {source}")]
    SinkWriteFailed {
        sink: String,
        row: usize,
        col: usize,
        #[source]
        source: SinkError,
    },

    #[error("Sink '{sink}' failed to close: {source}")]
    SinkCloseFailed {
        sink: String,
        #[source]
        source: SinkError,
    },

    #[error("Processing cancelled after {rows_completed} rows")]
    Cancelled { rows_completed: usize },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GridError>;

/// Stage of the run an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    Input,
    Header,
    Data,
    Sink,
    Run,
}

impl fmt::Display for ErrorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorStage::Input => "input",
            ErrorStage::Header => "header",
            ErrorStage::Data => "data",
            ErrorStage::Sink => "sink",
            ErrorStage::Run => "run",
        };
        f.write_str(name)
    }
}

impl GridError {
    /// Create an input unavailable error
    pub fn input_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::InputUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Create a missing parameter error
    pub fn missing_parameter(name: impl Into<String>, line: usize) -> Self {
        Self::MissingParameter {
            name: name.into(),
            line,
        }
    }

    /// Create a malformed value error
    pub fn malformed_value(field: impl Into<String>, token: impl Into<String>, line: usize) -> Self {
        Self::MalformedValue {
            field: field.into(),
            token: token.into(),
            line,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Stage of the run this error was raised in
    pub fn stage(&self) -> ErrorStage {
        match self {
            Self::InputUnavailable { .. } | Self::Io(_) => ErrorStage::Input,
            Self::TruncatedHeader { .. } | Self::MissingParameter { .. } => ErrorStage::Header,
            Self::MalformedValue { field, .. } if field.starts_with("cell[") => ErrorStage::Data,
            Self::MalformedValue { .. } => ErrorStage::Header,
            Self::RowWidthMismatch { .. }
            | Self::DataReadFailed { .. }
            | Self::TruncatedData { .. } => ErrorStage::Data,
            Self::SinkOpenFailed { .. }
            | Self::SinkWriteFailed { .. }
            | Self::SinkCloseFailed { .. } => ErrorStage::Sink,
            Self::Cancelled { .. } | Self::Configuration { .. } => ErrorStage::Run,
        }
    }

    /// Whether the run ended because it was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
