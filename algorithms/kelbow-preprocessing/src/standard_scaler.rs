//! Standard scaling
//!
//! Centers every feature on its mean and divides it by its standard deviation, so the scaled
//! features have zero mean and unit variance on the data the scaler was fitted on.
use crate::error::{PreprocessingError, Result};
use approx::abs_diff_eq;
use kelbow::dataset::{DatasetBase, Float};
use kelbow::traits::{Fit, Transformer};
use kelbow::ParamGuard;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2, Zip};
use tracing::debug;

/// Standard scaler
///
/// Use [`StandardScaler::params`] to configure the scaler, then fit it to a dataset:
///
/// ```
/// use kelbow::traits::{Fit, Transformer};
/// use kelbow::Observations;
/// use kelbow_preprocessing::StandardScaler;
/// use ndarray::array;
///
/// let dataset = Observations::from(array![[1., 1., 1., 1.], [3., 3., 3., 3.]]);
/// let scaler = StandardScaler::params().ddof(0).fit(&dataset).unwrap();
///
/// let scaled: ndarray::Array2<f64> = scaler.transform(dataset.records().clone()).unwrap();
/// assert_eq!(scaled.row(0).to_vec(), vec![-1.; 4]);
/// ```
pub struct StandardScaler;

impl StandardScaler {
    /// Scale to zero mean and unit sample standard deviation
    pub fn params() -> StandardScalerParams {
        StandardScalerParams(StandardScalerValidParams {
            with_mean: true,
            with_std: true,
            ddof: 1,
        })
    }
}

/// Checked parameters of the standard scaler
#[derive(Clone, Debug, PartialEq)]
pub struct StandardScalerValidParams {
    with_mean: bool,
    with_std: bool,
    ddof: usize,
}

impl StandardScalerValidParams {
    /// Whether features are centered on their mean
    pub fn with_mean(&self) -> bool {
        self.with_mean
    }

    /// Whether features are divided by their standard deviation
    pub fn with_std(&self) -> bool {
        self.with_std
    }

    /// Delta degrees of freedom of the standard deviation: `1` for the sample standard deviation
    /// (divide by `n - 1`), `0` for the population one (divide by `n`)
    pub fn ddof(&self) -> usize {
        self.ddof
    }
}

/// Builder for the standard scaler parameters
#[derive(Clone, Debug, PartialEq)]
pub struct StandardScalerParams(StandardScalerValidParams);

impl StandardScalerParams {
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.0.with_mean = with_mean;
        self
    }

    pub fn with_std(mut self, with_std: bool) -> Self {
        self.0.with_std = with_std;
        self
    }

    pub fn ddof(mut self, ddof: usize) -> Self {
        self.0.ddof = ddof;
        self
    }
}

impl ParamGuard for StandardScalerParams {
    type Checked = StandardScalerValidParams;
    type Error = PreprocessingError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.ddof > 1 {
            Err(PreprocessingError::InvalidDdof(self.0.ddof))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, D: Data<Elem = F>, T> Fit<ArrayBase<D, Ix2>, T, PreprocessingError>
    for StandardScalerValidParams
{
    type Object = FittedStandardScaler<F>;

    /// Fits the scaler, fails with `NotEnoughSamples` on less than `ddof + 1` records
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let records = dataset.records();
        let (nsamples, nfeatures) = records.dim();
        if nsamples == 0 || nsamples <= self.ddof {
            return Err(PreprocessingError::NotEnoughSamples);
        }

        let means = records
            .mean_axis(Axis(0))
            .ok_or(PreprocessingError::NotEnoughSamples)?;
        let std_devs = records.std_axis(Axis(0), F::cast(self.ddof));

        let offsets = if self.with_mean {
            means.clone()
        } else {
            Array1::zeros(nfeatures)
        };
        let scales = if self.with_std {
            std_devs.mapv(|s| {
                if abs_diff_eq!(s, F::zero()) {
                    // if feature is constant then don't scale
                    F::one()
                } else {
                    F::one() / s
                }
            })
        } else {
            Array1::ones(nfeatures)
        };
        debug!(nsamples, nfeatures, ddof = self.ddof, "fitted standard scaler");

        Ok(FittedStandardScaler {
            means,
            std_devs,
            offsets,
            scales,
        })
    }
}

/// Fitted standard scaler
///
/// Transforms every value `x` of feature `i` to `(x - offsets[i]) * scales[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedStandardScaler<F> {
    means: Array1<F>,
    std_devs: Array1<F>,
    offsets: Array1<F>,
    scales: Array1<F>,
}

impl<F: Float> FittedStandardScaler<F> {
    /// Feature means of the fit data
    pub fn means(&self) -> &Array1<F> {
        &self.means
    }

    /// Feature standard deviations of the fit data
    pub fn std_devs(&self) -> &Array1<F> {
        &self.std_devs
    }

    /// Value subtracted from every feature, zero when the scaler does not center
    pub fn offsets(&self) -> &Array1<F> {
        &self.offsets
    }

    /// Factor every centered feature is multiplied with
    ///
    /// This is one over the standard deviation, or one for constant features and scalers which
    /// do not scale.
    pub fn scales(&self) -> &Array1<F> {
        &self.scales
    }

    pub fn nfeatures(&self) -> usize {
        self.offsets.len()
    }

    fn check_features(&self, found: usize) -> Result<()> {
        if found != self.nfeatures() {
            return Err(PreprocessingError::DimensionMismatch {
                expected: self.nfeatures(),
                found,
            });
        }
        Ok(())
    }
}

impl<F: Float> Transformer<Array2<F>, Result<Array2<F>>> for FittedStandardScaler<F> {
    fn transform(&self, x: Array2<F>) -> Result<Array2<F>> {
        if x.is_empty() {
            return Ok(x);
        }
        self.check_features(x.ncols())?;

        let mut x = x;
        Zip::from(x.columns_mut())
            .and(self.offsets())
            .and(self.scales())
            .for_each(|mut col, &offset, &scale| {
                col.mapv_inplace(|el| (el - offset) * scale);
            });
        Ok(x)
    }
}

impl<'a, F: Float, D: Data<Elem = F>> Transformer<&'a ArrayBase<D, Ix1>, Result<Array1<F>>>
    for FittedStandardScaler<F>
{
    /// Scales a single observation
    fn transform(&self, x: &'a ArrayBase<D, Ix1>) -> Result<Array1<F>> {
        self.check_features(x.len())?;

        let mut scaled = x.to_owned();
        Zip::from(&mut scaled)
            .and(self.offsets())
            .and(self.scales())
            .for_each(|el, &offset, &scale| *el = (*el - offset) * scale);
        Ok(scaled)
    }
}

impl<F: Float, D: Data<Elem = F>, T>
    Transformer<DatasetBase<ArrayBase<D, Ix2>, T>, Result<DatasetBase<Array2<F>, T>>>
    for FittedStandardScaler<F>
{
    fn transform(&self, x: DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<DatasetBase<Array2<F>, T>> {
        let transformed_records = self.transform(x.records.to_owned())?;
        Ok(x.with_records(transformed_records))
    }
}
