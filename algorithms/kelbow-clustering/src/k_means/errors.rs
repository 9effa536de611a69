use std::path::PathBuf;
use thiserror::Error;

/// An error when fitting with an invalid hyperparameter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KMeansParamsError {
    #[error("n_clusters cannot be 0")]
    NClusters,
    #[error("n_runs cannot be 0")]
    NRuns,
    #[error("tolerance must be greater than 0")]
    Tolerance,
    #[error("max_n_iterations cannot be 0")]
    MaxIterations,
    #[error("precomputed initialization has {found} centroids, expected {expected}")]
    PrecomputedCentroids { expected: usize, found: usize },
    #[error("a sweep needs at least one candidate cluster count")]
    EmptySweep,
}

/// An error when modeling a KMeans algorithm
#[derive(Error, Debug)]
pub enum KMeansError {
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] KMeansParamsError),
    /// When there are fewer observations than clusters
    #[error("not enough samples: {n_clusters} clusters requested, but only {nsamples} observations")]
    NotEnoughSamples { n_clusters: usize, nsamples: usize },
    /// When observations and centroids live in spaces of different dimension
    #[error("dimension mismatch: model has {expected} features, input has {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no model found at {}", .0.display())]
    ModelNotFound(PathBuf),
    /// Saving refused, a different model is already stored at the location
    #[error("a different model already exists at {}", .0.display())]
    ModelExists(PathBuf),
    #[error("corrupt model: {0}")]
    CorruptModel(String),
    #[error(transparent)]
    KelbowError(#[from] kelbow::error::Error),
}
