//! `kelbow-clustering` trains K-means models and helps with picking their number of clusters.
//!
//! ## The big picture
//!
//! `kelbow-clustering` is the modelling crate of the `kelbow` workspace. The data it works on
//! is usually standardized first with `kelbow-preprocessing`.
//!
//! ## Current state
//!
//! Right now `kelbow-clustering` provides:
//! * [K-Means](KMeans) with random, K-means++ and K-means|| initialization
//! * a [sweep](ClusterSweep) over candidate cluster counts, with an
//! [elbow heuristic](SweepResults::suggest_elbow) on top of the recorded costs
//! * [persistence](persistence) of fitted models as JSON documents
//!
//! Implementation choices, algorithmic details and tutorials can be found in the page dedicated
//! to the specific algorithms.
#[allow(clippy::new_ret_no_self)]
mod k_means;
pub mod persistence;
mod sweep;

pub use k_means::*;
pub use persistence::SavePolicy;
pub use sweep::*;
