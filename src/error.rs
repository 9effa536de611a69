//! Error types in kelbow
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("not enough samples")]
    NotEnoughSamples,
    #[error("mismatched dimensions: expected {expected} features, found {found}")]
    MismatchedDimensions { expected: usize, found: usize },
    #[error("failed to build session thread pool: {0}")]
    ThreadPool(String),
}
