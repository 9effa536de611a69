use super::{DatasetBase, Float, Records};
use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix2};
use rand::Rng;
use rand_distr::{Distribution, Poisson};

/// Implementation without constraints on records and targets
///
/// This implementation block provides a method for the creation of datasets
/// from records and targets, as well as the accessors and builders shared by
/// all datasets.
impl<R: Records, T> DatasetBase<R, T> {
    /// Create a new dataset from records and targets
    pub fn new(records: R, targets: T) -> DatasetBase<R, T> {
        DatasetBase {
            records,
            targets,
            feature_names: Vec::new(),
        }
    }

    /// Returns reference to targets
    pub fn targets(&self) -> &T {
        &self.targets
    }

    /// Returns reference to records
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Returns feature names
    ///
    /// A feature name gives a human-readable string describing the purpose of a single feature.
    /// If no names were given, generic `feature-<index>` names are generated.
    pub fn feature_names(&self) -> Vec<String> {
        if !self.feature_names.is_empty() {
            self.feature_names.clone()
        } else {
            (0..self.records.nfeatures())
                .map(|idx| format!("feature-{}", idx))
                .collect()
        }
    }

    /// Updates the records of a dataset
    ///
    /// This function overwrites the records in a dataset. It also invalidates the feature
    /// names, unless the number of features is unchanged.
    pub fn with_records<T2: Records>(self, records: T2) -> DatasetBase<T2, T> {
        let feature_names = if records.nfeatures() == self.records.nfeatures() {
            self.feature_names
        } else {
            Vec::new()
        };

        DatasetBase {
            records,
            targets: self.targets,
            feature_names,
        }
    }

    /// Updates the targets of a dataset
    pub fn with_targets<T2>(self, targets: T2) -> DatasetBase<R, T2> {
        DatasetBase {
            records: self.records,
            targets,
            feature_names: self.feature_names,
        }
    }

    /// Sets the feature names
    pub fn with_feature_names<I: Into<String>>(mut self, names: Vec<I>) -> DatasetBase<R, T> {
        let feature_names = names.into_iter().map(|x| x.into()).collect();

        self.feature_names = feature_names;

        self
    }
}

impl<F: Float, D: Data<Elem = F>, T> DatasetBase<ArrayBase<D, Ix2>, T> {
    /// Creates a view of the dataset
    ///
    /// Views borrow the materialised records, so repeated passes over a dataset never copy it.
    pub fn view(&self) -> DatasetBase<ArrayView2<'_, F>, &T> {
        DatasetBase {
            records: self.records.view(),
            targets: &self.targets,
            feature_names: self.feature_names.clone(),
        }
    }

    /// Applies a function to every record and collects the results into a new dataset
    ///
    /// All mapped records must share the same length, otherwise
    /// `Error::MismatchedDimensions` is returned.
    pub fn map_records<G>(self, fnc: G) -> Result<DatasetBase<Array2<F>, T>>
    where
        G: Fn(ArrayView1<F>) -> Array1<F>,
    {
        let nsamples = self.records.nsamples();
        let mut nfeatures = None;
        let mut values = Vec::new();

        for row in self.records.rows() {
            let mapped = fnc(row);
            match nfeatures {
                None => nfeatures = Some(mapped.len()),
                Some(expected) if expected != mapped.len() => {
                    return Err(Error::MismatchedDimensions {
                        expected,
                        found: mapped.len(),
                    })
                }
                _ => {}
            }
            values.extend(mapped.iter().copied());
        }

        let records = Array2::from_shape_vec((nsamples, nfeatures.unwrap_or(0)), values)?;

        Ok(self.with_records(records))
    }
}

impl<F: Float, D: Data<Elem = F>> DatasetBase<ArrayBase<D, Ix2>, ()> {
    /// Draws a random sample of the records
    ///
    /// Without replacement every record is kept independently with probability `fraction`
    /// (Bernoulli sampling), so `fraction` has to lie in `(0, 1]`. With replacement every record
    /// is repeated a Poisson(`fraction`) distributed number of times and `fraction` may exceed
    /// one. Kept records stay in their original order. The sample size is random, its
    /// expectation is `fraction * nsamples`.
    pub fn sample(
        &self,
        with_replacement: bool,
        fraction: f64,
        rng: &mut impl Rng,
    ) -> Result<DatasetBase<Array2<F>, ()>> {
        let indices = sample_indices(self.records.nsamples(), with_replacement, fraction, rng)?;
        let records = self.records.select(Axis(0), &indices);

        Ok(DatasetBase {
            records,
            targets: (),
            feature_names: self.feature_names.clone(),
        })
    }
}

/// Row indices of a random sample, see `DatasetBase::sample`
pub fn sample_indices(
    nsamples: usize,
    with_replacement: bool,
    fraction: f64,
    rng: &mut impl Rng,
) -> Result<Vec<usize>> {
    if with_replacement {
        if !(fraction > 0.0 && fraction.is_finite()) {
            return Err(Error::Parameters(format!(
                "sampling fraction with replacement must be positive, but was {}",
                fraction
            )));
        }
        let poisson = Poisson::new(fraction)
            .map_err(|err| Error::Parameters(format!("invalid sampling fraction: {}", err)))?;

        let mut indices = Vec::new();
        for idx in 0..nsamples {
            let count: f64 = poisson.sample(rng);
            indices.extend(std::iter::repeat(idx).take(count as usize));
        }
        Ok(indices)
    } else {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(Error::Parameters(format!(
                "sampling fraction without replacement must be in (0, 1], but was {}",
                fraction
            )));
        }

        Ok((0..nsamples)
            .filter(|_| rng.gen::<f64>() < fraction)
            .collect())
    }
}

impl<F: Float> From<Array2<F>> for DatasetBase<Array2<F>, ()> {
    fn from(records: Array2<F>) -> Self {
        DatasetBase::new(records, ())
    }
}

impl<F: Float, T> From<(Array2<F>, Array1<T>)> for DatasetBase<Array2<F>, Array1<T>> {
    fn from(rec_tar: (Array2<F>, Array1<T>)) -> Self {
        DatasetBase::new(rec_tar.0, rec_tar.1)
    }
}

impl<'a, F: Float> From<ArrayView2<'a, F>> for DatasetBase<ArrayView2<'a, F>, ()> {
    fn from(records: ArrayView2<'a, F>) -> Self {
        DatasetBase::new(records, ())
    }
}
