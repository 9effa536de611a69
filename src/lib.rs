//! `kelbow` is a small toolkit to explore K-means clusterings of tabular data with Rust.
//!
//! It follows the classic exploratory recipe: standardize the features, sweep a range of
//! cluster counts to look for an "elbow" in the clustering cost, train a final model at the
//! chosen cluster count, predict memberships and persist the model for later use.
//!
//! The workspace is split like this:
//!
//! * `kelbow` (this crate) holds the shared building blocks: the [`DatasetBase`] structure, the
//! [`Fit`](traits::Fit), [`Predict`](traits::Predict) and [`Transformer`](traits::Transformer)
//! traits, hyperparameter checking with [`ParamGuard`], column [summary](summary) statistics
//! and the [`Session`](session::Session) every workflow stage runs in.
//! * `kelbow-datasets` parses delimited text into feature matrices and bundles the iris data.
//! * `kelbow-preprocessing` provides the standard scaler.
//! * `kelbow-clustering` provides K-means, the cluster-count sweep and model persistence.
//! * `kelbow-cli` glues everything together into the `kelbow` binary.
//!

pub mod dataset;
pub mod error;
mod param_guard;
pub mod prelude;
pub mod session;
pub mod summary;
pub mod traits;

pub use dataset::{Dataset, DatasetBase, DatasetView, Float, Observations};
pub use error::Error;
pub use param_guard::ParamGuard;
