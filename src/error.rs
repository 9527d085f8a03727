use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input path: {0} does not exist or is not a file/directory")]
    InvalidInputPath(PathBuf),

    #[error("No valid input: none of the given files could be loaded")]
    NoValidInput,

    #[error("{file}: {count} column names given but the table has {width} columns")]
    NameCountMismatch {
        file: String,
        count: usize,
        width: usize,
    },

    #[error("{file}, line {line}: expected at most {expected} fields, found {found}")]
    RaggedRow {
        file: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{file}: header row {header} is past the end of the data")]
    MissingHeader { file: String, header: usize },

    #[error("{0}: workbook has no worksheet")]
    EmptyWorkbook(String),

    #[error("At least two column names are required, got {0}")]
    InsufficientNames(usize),

    #[error("Insufficient common columns: need two shared by all files, found {0:?}")]
    InsufficientCommonColumns(Vec<String>),

    #[error("Column '{0}' not found in the data")]
    ColumnNotFound(String),

    #[error("Unknown color '{0}'")]
    InvalidColor(String),

    #[error("Unknown marker '{0}'")]
    InvalidMarker(String),

    #[error("No encoder for output file: {0}")]
    UnsupportedOutput(PathBuf),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Display window failed: {0}")]
    Display(String),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Data processing error (Polars)")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Delimited text error")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error (Calamine)")]
    Excel(#[from] calamine::Error),
}
