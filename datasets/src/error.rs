//! Error definitions for dataset loading
use std::num::ParseFloatError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatasetError>;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read delimited text from {origin}: {source}")]
    Read {
        origin: String,
        #[source]
        source: csv::Error,
    },
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("line {line}, field {column}: `{field}` is not a number")]
    Parse {
        line: u64,
        column: usize,
        field: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("line {line}, field {column}: `{field}` is not a finite number")]
    NonFinite {
        line: u64,
        column: usize,
        field: String,
    },
    #[error(transparent)]
    NdShape(#[from] ndarray::ShapeError),
}
