//! `kelbow-datasets` turns delimited text into feature matrices and bundles the iris dataset.
//!
//! ## The Big Picture
//!
//! `kelbow-datasets` is a crate in the `kelbow` workspace. Input files hold one observation per
//! line with comma separated numeric fields. [`TextSource`] reads such a file, keeps the rows for
//! a preview and parses them into an `Array2<f64>`; [`parse_vector`] parses a single line.
//!
//! ## Bundled data
//!
//! * `["iris"]` : the four measurements of the iris flower dataset, without species labels
//! * `["generate"]` : synthetic gaussian blobs for tests and benchmarks
//!
//! ```ignore
//! let observations = kelbow_datasets::iris();
//! assert_eq!(observations.records().dim(), (150, 4));
//! ```

pub mod error;
#[cfg(feature = "generate")]
pub mod generate;
mod parse;

pub use error::{DatasetError, Result};
pub use parse::{parse_vector, TextRow, TextSource};

#[cfg(feature = "iris")]
use kelbow::Observations;

#[cfg(feature = "iris")]
/// Read in the iris-flower measurements.
// One row per flower: sepal length, sepal width, petal length, petal width (in cm)
pub fn iris() -> Observations<f64> {
    let data = include_str!("../data/iris.data");
    let records = TextSource::from_reader(data.as_bytes(), "iris.data")
        .and_then(|source| source.parse(4))
        .unwrap();

    let feature_names = vec!["sepal length", "sepal width", "petal length", "petal width"];

    Observations::from(records).with_feature_names(feature_names)
}

#[cfg(all(test, feature = "iris"))]
mod tests {
    use super::*;
    use kelbow::summary::ColumnSummary;
    use ndarray::array;

    #[test]
    fn iris_has_150_complete_rows() {
        let iris = iris();
        assert_eq!(iris.records().dim(), (150, 4));
        assert_eq!(iris.feature_names()[2], "petal length");

        let summary = iris.summary().unwrap();
        assert_eq!(*summary.min(), array![4.3, 2.0, 1.0, 0.1]);
        assert_eq!(*summary.max(), array![7.9, 4.4, 6.9, 2.5]);
    }
}
