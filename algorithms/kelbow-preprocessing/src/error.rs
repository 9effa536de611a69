//! Error definitions for preprocessing
use thiserror::Error;
pub type Result<T> = std::result::Result<T, PreprocessingError>;

#[derive(Error, Debug, Clone)]
pub enum PreprocessingError {
    #[error("not enough samples")]
    NotEnoughSamples,
    #[error("scaler was fitted on {expected} features, input has {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("delta degrees of freedom have to be 0 or 1, found {0}")]
    InvalidDdof(usize),
    #[error(transparent)]
    KelbowError(#[from] kelbow::error::Error),
}
