//! Column-wise summary statistics
//!
//! The statistics of every feature (maximum, minimum, mean, variance, number of non-zero
//! entries, L1 and L2 norm) are accumulated in a single pass. Partial accumulators can be merged
//! in any order, so rows are folded in parallel and the partial results reduced afterwards.
use crate::dataset::{DatasetBase, Float};
use crate::error::{Error, Result};
use ndarray::parallel::prelude::*;
use ndarray::{Array1, ArrayBase, ArrayView1, Axis, Data, Ix1, Ix2, Zip};
use std::fmt;

/// Per-feature statistics of a set of records
///
/// The variance is the unbiased sample variance, dividing the squared deviations by
/// `count - 1`. A single observation has zero variance.
#[derive(Clone, Debug, PartialEq)]
pub struct MultivariateSummary<F> {
    count: usize,
    max: Array1<F>,
    min: Array1<F>,
    mean: Array1<F>,
    variance: Array1<F>,
    num_nonzeros: Array1<usize>,
    norm_l1: Array1<F>,
    norm_l2: Array1<F>,
}

impl<F: Float> MultivariateSummary<F> {
    /// Number of observations
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn max(&self) -> &Array1<F> {
        &self.max
    }

    pub fn min(&self) -> &Array1<F> {
        &self.min
    }

    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Unbiased sample variance of every feature
    pub fn variance(&self) -> &Array1<F> {
        &self.variance
    }

    /// Sample standard deviation of every feature
    pub fn std_dev(&self) -> Array1<F> {
        self.variance.mapv(|v| v.sqrt())
    }

    pub fn num_nonzeros(&self) -> &Array1<usize> {
        &self.num_nonzeros
    }

    pub fn norm_l1(&self) -> &Array1<F> {
        &self.norm_l1
    }

    pub fn norm_l2(&self) -> &Array1<F> {
        &self.norm_l2
    }
}

impl<F: Float> fmt::Display for MultivariateSummary<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " Max : {}", DisplayVector(self.max.view()))?;
        writeln!(f, " Min : {}", DisplayVector(self.min.view()))?;
        writeln!(f, " Mean : {}", DisplayVector(self.mean.view()))?;
        write!(f, " Variance : {}", DisplayVector(self.variance.view()))
    }
}

/// Renders a vector as `[x0,x1,...]`
pub struct DisplayVector<'a, F>(pub ArrayView1<'a, F>);

impl<'a, F: fmt::Display> fmt::Display for DisplayVector<'a, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, value) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "]")
    }
}

/// Single pass accumulator behind `MultivariateSummary`
///
/// Mean and variance use Welford's update, partial accumulators are combined with the
/// pairwise formula of Chan et al.
#[derive(Clone, Debug)]
pub struct SummaryAccumulator<F> {
    count: usize,
    mean: Array1<F>,
    m2: Array1<F>,
    max: Array1<F>,
    min: Array1<F>,
    num_nonzeros: Array1<usize>,
    norm_l1: Array1<F>,
    sum_squares: Array1<F>,
}

impl<F: Float> SummaryAccumulator<F> {
    pub fn new(nfeatures: usize) -> Self {
        SummaryAccumulator {
            count: 0,
            mean: Array1::zeros(nfeatures),
            m2: Array1::zeros(nfeatures),
            max: Array1::from_elem(nfeatures, F::neg_infinity()),
            min: Array1::from_elem(nfeatures, F::infinity()),
            num_nonzeros: Array1::zeros(nfeatures),
            norm_l1: Array1::zeros(nfeatures),
            sum_squares: Array1::zeros(nfeatures),
        }
    }

    /// Adds one observation
    pub fn update(&mut self, observation: &ArrayBase<impl Data<Elem = F>, Ix1>) {
        self.count += 1;
        let n = F::cast(self.count);

        Zip::from(&mut self.mean)
            .and(&mut self.m2)
            .and(observation)
            .for_each(|mean, m2, &x| {
                let delta = x - *mean;
                *mean += delta / n;
                *m2 += delta * (x - *mean);
            });

        Zip::from(&mut self.max)
            .and(&mut self.min)
            .and(&mut self.num_nonzeros)
            .and(observation)
            .for_each(|max, min, nnz, &x| {
                if x > *max {
                    *max = x;
                }
                if x < *min {
                    *min = x;
                }
                if x != F::zero() {
                    *nnz += 1;
                }
            });

        Zip::from(&mut self.norm_l1)
            .and(&mut self.sum_squares)
            .and(observation)
            .for_each(|l1, sq, &x| {
                *l1 += x.abs();
                *sq += x * x;
            });
    }

    /// Combines two partial accumulators
    pub fn merge(self, other: Self) -> Self {
        if other.count == 0 {
            return self;
        }
        if self.count == 0 {
            return other;
        }

        let (na, nb) = (F::cast(self.count), F::cast(other.count));
        let n = na + nb;

        let delta = &other.mean - &self.mean;
        let mean = &self.mean + &(&delta * (nb / n));
        let m2 = &self.m2 + &other.m2 + &delta.mapv(|d| d * d * na * nb / n);

        let mut max = self.max;
        Zip::from(&mut max)
            .and(&other.max)
            .for_each(|a, &b| *a = if b > *a { b } else { *a });
        let mut min = self.min;
        Zip::from(&mut min)
            .and(&other.min)
            .for_each(|a, &b| *a = if b < *a { b } else { *a });

        SummaryAccumulator {
            count: self.count + other.count,
            mean,
            m2,
            max,
            min,
            num_nonzeros: self.num_nonzeros + other.num_nonzeros,
            norm_l1: self.norm_l1 + other.norm_l1,
            sum_squares: self.sum_squares + other.sum_squares,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Finalizes the statistics, fails for an empty accumulator
    pub fn finish(self) -> Result<MultivariateSummary<F>> {
        if self.count == 0 {
            return Err(Error::NotEnoughSamples);
        }

        let variance = if self.count > 1 {
            let denominator = F::cast(self.count - 1);
            self.m2.mapv(|m2| m2 / denominator)
        } else {
            Array1::zeros(self.m2.len())
        };

        Ok(MultivariateSummary {
            count: self.count,
            max: self.max,
            min: self.min,
            mean: self.mean,
            variance,
            num_nonzeros: self.num_nonzeros,
            norm_l1: self.norm_l1,
            norm_l2: self.sum_squares.mapv(|sq| sq.sqrt()),
        })
    }
}

/// Compute the summary statistics of every column
pub trait ColumnSummary<F> {
    fn summary(&self) -> Result<MultivariateSummary<F>>;
}

impl<F: Float, D: Data<Elem = F>> ColumnSummary<F> for ArrayBase<D, Ix2> {
    fn summary(&self) -> Result<MultivariateSummary<F>> {
        let nfeatures = self.ncols();

        self.axis_iter(Axis(0))
            .into_par_iter()
            .fold(
                || SummaryAccumulator::new(nfeatures),
                |mut acc, row| {
                    acc.update(&row);
                    acc
                },
            )
            .reduce(|| SummaryAccumulator::new(nfeatures), SummaryAccumulator::merge)
            .finish()
    }
}

impl<F: Float, D: Data<Elem = F>, T> ColumnSummary<F> for DatasetBase<ArrayBase<D, Ix2>, T> {
    fn summary(&self) -> Result<MultivariateSummary<F>> {
        self.records.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand_xoshiro::Xoshiro256Plus;

    fn iris_records() -> Array2<f64> {
        let values = include_str!("../datasets/data/iris.data")
            .lines()
            .filter(|line| !line.is_empty())
            .flat_map(|line| line.split(','))
            .map(|field| field.parse::<f64>().unwrap())
            .collect::<Vec<_>>();
        Array2::from_shape_vec((values.len() / 4, 4), values).unwrap()
    }

    #[test]
    fn iris_column_statistics() {
        let iris = crate::Observations::from(iris_records());
        let summary = iris.summary().unwrap();

        assert_eq!(summary.count(), 150);
        assert_abs_diff_eq!(*summary.max(), array![7.9, 4.4, 6.9, 2.5]);
        assert_abs_diff_eq!(*summary.min(), array![4.3, 2.0, 1.0, 0.1]);
        assert_abs_diff_eq!(
            *summary.mean(),
            array![5.8433, 3.054, 3.7587, 1.1987],
            epsilon = 1e-4
        );
        assert_abs_diff_eq!(
            *summary.variance(),
            array![0.6857, 0.1880, 3.1132, 0.5824],
            epsilon = 1e-3
        );
        assert!(summary.num_nonzeros().iter().all(|&n| n == 150));
    }

    #[test]
    fn summary_matches_direct_computation() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let records: Array2<f64> = Array2::random_using((500, 3), Uniform::new(-10., 10.), &mut rng);

        let summary = records.summary().unwrap();
        assert_eq!(summary.count(), 500);
        assert_abs_diff_eq!(
            *summary.mean(),
            records.mean_axis(Axis(0)).unwrap(),
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            *summary.variance(),
            records.var_axis(Axis(0), 1.),
            epsilon = 1e-8
        );
        assert_abs_diff_eq!(
            *summary.norm_l1(),
            records.mapv(f64::abs).sum_axis(Axis(0)),
            epsilon = 1e-8
        );
        assert_abs_diff_eq!(
            *summary.norm_l2(),
            records.mapv(|x| x * x).sum_axis(Axis(0)).mapv(f64::sqrt),
            epsilon = 1e-8
        );
    }

    #[test]
    fn oracle_test_for_small_matrix() {
        let records = array![[1., 0., -2.], [3., 0., 2.], [5., 4., 0.]];
        let summary = records.summary().unwrap();

        assert_abs_diff_eq!(*summary.max(), array![5., 4., 2.]);
        assert_abs_diff_eq!(*summary.min(), array![1., 0., -2.]);
        assert_abs_diff_eq!(*summary.mean(), array![3., 4. / 3., 0.]);
        assert_abs_diff_eq!(
            *summary.variance(),
            array![4., 16. / 3., 4.],
            epsilon = 1e-12
        );
        assert_eq!(*summary.num_nonzeros(), array![3usize, 1, 2]);
    }

    #[test]
    fn single_observation_has_zero_variance() {
        let summary = array![[1., 2.]].summary().unwrap();
        assert_abs_diff_eq!(*summary.variance(), array![0., 0.]);
        assert_abs_diff_eq!(*summary.mean(), array![1., 2.]);
    }

    #[test]
    fn empty_records_fail() {
        let records: Array2<f64> = Array2::zeros((0, 4));
        assert!(matches!(records.summary(), Err(Error::NotEnoughSamples)));
    }

    #[test]
    fn merge_is_order_independent() {
        let records = array![[1., 10.], [2., 20.], [4., 40.], [8., 80.], [16., 160.]];

        let accumulate = |rows: &[usize]| {
            let mut acc = SummaryAccumulator::new(2);
            for &idx in rows {
                acc.update(&records.row(idx));
            }
            acc
        };

        let left = accumulate(&[0, 1]).merge(accumulate(&[2, 3, 4]));
        let right = accumulate(&[3, 4])
            .merge(accumulate(&[]))
            .merge(accumulate(&[0, 2, 1]));

        let (left, right) = (left.finish().unwrap(), right.finish().unwrap());
        assert_eq!(left.count(), right.count());
        assert_abs_diff_eq!(*left.mean(), *right.mean(), epsilon = 1e-12);
        assert_abs_diff_eq!(*left.variance(), *right.variance(), epsilon = 1e-9);
        assert_abs_diff_eq!(*left.max(), *right.max());
        assert_abs_diff_eq!(*left.min(), *right.min());
    }

    #[test]
    fn display_lists_all_statistics() {
        let summary = array![[1., 2.], [3., 4.]].summary().unwrap();
        let report = summary.to_string();

        assert!(report.contains(" Max : [3,4]"));
        assert!(report.contains(" Min : [1,2]"));
        assert!(report.contains(" Mean : [2,3]"));
        assert!(report.contains(" Variance : [2,2]"));
    }
}
