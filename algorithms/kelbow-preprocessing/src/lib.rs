//! # Preprocessing
//! ## The Big Picture
//!
//! `kelbow-preprocessing` is a crate in the `kelbow` workspace. It holds the transformations
//! applied to the features before the clustering algorithms see them.
//!
//! ## Current state
//! `kelbow-preprocessing` provides the standard scaler, which centers every feature on its mean
//! and divides it by its standard deviation. The fitted scaler transforms matrices, datasets and
//! single observations, so new points can be projected into the space the model was trained in.

pub mod error;
pub mod standard_scaler;

pub use error::PreprocessingError;
pub use standard_scaler::{
    FittedStandardScaler, StandardScaler, StandardScalerParams, StandardScalerValidParams,
};
