//! Cluster-count sweep
//!
//! Trains one K-means model per candidate cluster count and records the cost of each, so the
//! "elbow" of the cost curve can be inspected or picked automatically.
use crate::k_means::{KMeans, KMeansError, KMeansInit, KMeansParamsError};
use kelbow::traits::Fit;
use kelbow::{DatasetBase, Float};
use ndarray::{ArrayBase, Data, Ix2};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use std::fmt;
use tracing::info;

/// Cost of the model trained with `n_clusters` clusters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepResult<F> {
    pub n_clusters: usize,
    pub cost: F,
}

/// Sweep results in the order the candidates were given
#[derive(Clone, Debug, PartialEq)]
pub struct SweepResults<F>(Vec<SweepResult<F>>);

impl<F: Float> SweepResults<F> {
    pub fn iter(&self) -> impl Iterator<Item = &SweepResult<F>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cost recorded for `n_clusters`, if it was one of the candidates
    pub fn cost_of(&self, n_clusters: usize) -> Option<F> {
        self.0
            .iter()
            .find(|result| result.n_clusters == n_clusters)
            .map(|result| result.cost)
    }

    /// Elbow heuristic
    ///
    /// Returns the cluster count with the largest second difference of consecutive costs,
    /// `cost[i - 1] - 2 * cost[i] + cost[i + 1]`, looking at the results in candidate order. The
    /// first and last candidate are never suggested, with fewer than three results there is no
    /// suggestion. Ties go to the smaller position.
    pub fn suggest_elbow(&self) -> Option<usize> {
        let mut best: Option<(usize, F)> = None;
        for window in self.0.windows(3) {
            let curvature = window[0].cost - F::cast(2.) * window[1].cost + window[2].cost;
            if best.map_or(true, |(_, max)| curvature > max) {
                best = Some((window[1].n_clusters, curvature));
            }
        }
        best.map(|(n_clusters, _)| n_clusters)
    }
}

impl<F: Float> IntoIterator for SweepResults<F> {
    type Item = SweepResult<F>;
    type IntoIter = std::vec::IntoIter<SweepResult<F>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<F: Float> fmt::Display for SweepResults<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.0 {
            writeln!(
                f,
                "Sum of squared distances of points to their nearest center when k={} -> {}",
                result.n_clusters, result.cost
            )?;
        }
        Ok(())
    }
}

/// Sweep over candidate cluster counts
///
/// Every candidate is trained from a clone of the configured random generator, so with a seeded
/// generator the costs are reproducible and independent of the candidate order.
#[derive(Clone, Debug)]
pub struct ClusterSweep<F: Float, R: Rng> {
    candidates: Vec<usize>,
    max_n_iterations: u64,
    tolerance: F,
    init: KMeansInit<F>,
    rng: R,
}

impl<F: Float> ClusterSweep<F, Xoshiro256Plus> {
    pub fn new(candidates: Vec<usize>) -> Self {
        ClusterSweep::with_rng(candidates, Xoshiro256Plus::seed_from_u64(42))
    }
}

impl<F: Float, R: Rng + Clone> ClusterSweep<F, R> {
    /// Sweep with 5 iterations per candidate, tolerance `1e-4` and k-means|| initialization
    pub fn with_rng(candidates: Vec<usize>, rng: R) -> Self {
        ClusterSweep {
            candidates,
            max_n_iterations: 5,
            tolerance: F::cast(1e-4),
            init: KMeansInit::KMeansPara,
            rng,
        }
    }

    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.max_n_iterations = max_n_iterations;
        self
    }

    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Initialization of every candidate model, a precomputed initialization only fits one
    /// candidate count
    pub fn init_method(mut self, init: KMeansInit<F>) -> Self {
        self.init = init;
        self
    }

    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    /// Trains and scores every candidate on `records`
    ///
    /// Fails on the first candidate which cannot be trained, for example because it asks for more
    /// clusters than there are observations.
    pub fn run<D: Data<Elem = F>>(
        &self,
        records: &ArrayBase<D, Ix2>,
    ) -> Result<SweepResults<F>, KMeansError> {
        if self.candidates.is_empty() {
            return Err(KMeansParamsError::EmptySweep.into());
        }

        let dataset = DatasetBase::new(records.view(), ());
        let mut results = Vec::with_capacity(self.candidates.len());
        for &n_clusters in &self.candidates {
            let model = KMeans::params_with_rng(n_clusters, self.rng.clone())
                .max_n_iterations(self.max_n_iterations)
                .tolerance(self.tolerance)
                .init_method(self.init.clone())
                .fit(&dataset)?;
            let cost = model.compute_cost(records)?;
            info!(
                k = n_clusters,
                cost = %cost,
                iterations = model.n_iterations(),
                "sweep candidate trained"
            );

            results.push(SweepResult { n_clusters, cost });
        }

        Ok(SweepResults(results))
    }
}
