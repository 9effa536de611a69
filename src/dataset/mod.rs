//! Datasets
//!
//! This module implements the dataset struct and the helper traits the algorithm crates build
//! on. Records are always kept in memory as `ndarray` matrices, so a dataset which is reused by
//! several passes (statistics, sweep, training, prediction) is materialised once and handed out
//! by reference or as a view afterwards.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ScalarOperand};

use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast, Signed};
use rand::distributions::uniform::SampleUniform;

use std::cmp::PartialOrd;
use std::fmt;
use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

mod impl_dataset;
mod impl_records;

pub use impl_dataset::sample_indices;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. They are used in the records of a
/// dataset, in fitted scalers and in cluster centroids.
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Signed
    + Sum
    + NumAssignOps
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + SampleUniform
    + ScalarOperand
    + approx::AbsDiffEq<Epsilon = Self>
    + 'static
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// DatasetBase
///
/// This is the fundamental structure of a dataset. It contains a number of records about the
/// data and may contain targets and feature names. The dataset base is only generic over the
/// records and targets and introduces a trait bound on the records. `feature_names` are always
/// owned and copied when views are created.
///
/// # Fields
///
/// * `records`: a two-dimensional matrix with dimensionality (nsamples, nfeatures)
/// * `targets`: `()` for unlabeled observations, or a one-dimensional array with one entry per
/// sample, for example the cluster memberships assigned by a clustering model
/// * `feature_names`: optional descriptive feature names with dimensionality (nfeatures)
pub struct DatasetBase<R, T>
where
    R: Records,
{
    pub records: R,
    pub targets: T,

    feature_names: Vec<String>,
}

/// Dataset
///
/// An owned dataset with one target per record.
pub type Dataset<F, T> = DatasetBase<Array2<F>, Array1<T>>;

/// DatasetView
///
/// A read only view of a Dataset
pub type DatasetView<'a, F, T> = DatasetBase<ArrayView2<'a, F>, ArrayView1<'a, T>>;

/// Observations without any targets, the input of every unsupervised algorithm
pub type Observations<F> = DatasetBase<Array2<F>, ()>;

/// Record trait
pub trait Records: Sized {
    type Elem;

    fn nsamples(&self) -> usize;
    fn nfeatures(&self) -> usize;
}
