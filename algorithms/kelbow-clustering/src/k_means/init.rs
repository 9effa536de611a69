use super::algorithm::{closest_centroid, update_min_dists};
use kelbow::Float;
use ndarray::{s, Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix1, Ix2};
use ndarray_rand::rand;
use ndarray_rand::rand::distributions::{Distribution, WeightedIndex};
use ndarray_rand::rand::Rng;
use tracing::trace;

/// Number of sampling rounds of k-means||
const PARA_ROUNDS: usize = 2;

#[derive(Clone, Debug, PartialEq)]
/// Specifies centroid initialization algorithm for KMeans.
pub enum KMeansInit<F: Float> {
    /// Pick random points as centroids.
    Random,
    /// Precomputed list of centroids, represented as an array of (n_centroids, n_features).
    Precomputed(Array2<F>),
    /// K-means++ algorithm. Using this over random initialization causes K-means to converge
    /// faster for almost all cases, since K-means++ produces better centroids.
    KMeansPlusPlus,
    /// K-means|| algorithm, a parallelized version of K-means++. It oversamples `2 *
    /// n_clusters` candidates in each of its rounds and then reduces the candidates to
    /// `n_clusters` centroids with a weighted K-means++.
    KMeansPara,
}

impl<F: Float> KMeansInit<F> {
    /// Runs the chosen initialization routine
    ///
    /// `observations` must hold at least `n_clusters` rows.
    pub(crate) fn run<R: Rng>(
        &self,
        n_clusters: usize,
        observations: ArrayView2<F>,
        rng: &mut R,
    ) -> Array2<F> {
        match self {
            Self::Random => random_init(n_clusters, observations, rng),
            Self::KMeansPlusPlus => k_means_plusplus(n_clusters, observations, rng),
            Self::KMeansPara => k_means_para(n_clusters, observations, rng),
            Self::Precomputed(centroids) => centroids.clone(),
        }
    }
}

/// Pick random points from the input matrix as centroids
fn random_init<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let (n_samples, _) = observations.dim();
    let indices = rand::seq::index::sample(rng, n_samples, n_clusters).into_vec();
    observations.select(Axis(0), &indices)
}

/// Selects centroids using the KMeans++ initialization algorithm.
fn k_means_plusplus<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let weights: Array1<F> = Array1::ones(observations.nrows());
    weighted_k_means_plusplus(n_clusters, observations, &weights, rng)
}

/// K-means++ where every observation carries a weight
///
/// The first centroid is drawn proportionally to the weights, every following one
/// proportionally to weight times the squared distance to the closest chosen centroid.
/// When all remaining candidates coincide with a chosen centroid, a uniformly random
/// observation is taken instead.
fn weighted_k_means_plusplus<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    weights: &ArrayBase<impl Data<Elem = F>, Ix1>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let (n_samples, n_features) = observations.dim();
    let mut centroids = Array2::zeros((n_clusters, n_features));

    let first = sample_weighted(weights, rng);
    centroids.row_mut(0).assign(&observations.row(first));

    let mut dists: Array1<F> = Array1::zeros(n_samples);
    for c_cnt in 1..n_clusters {
        update_min_dists(&centroids.slice(s![0..c_cnt, ..]), &observations, &mut dists);
        dists *= weights;
        let centroid_idx = sample_weighted(&dists, rng);
        centroids
            .row_mut(c_cnt)
            .assign(&observations.row(centroid_idx));
    }
    centroids
}

/// Index drawn proportionally to `weights`, uniform if no weight is positive
fn sample_weighted<F: Float>(
    weights: &ArrayBase<impl Data<Elem = F>, Ix1>,
    rng: &mut impl Rng,
) -> usize {
    match WeightedIndex::new(weights.iter()) {
        Ok(distribution) => distribution.sample(rng),
        Err(_) => rng.gen_range(0..weights.len()),
    }
}

/// Selects centroids using the k-means|| initialization algorithm (Bahmani et al).
///
/// Starting from one random observation, every round keeps each observation independently with
/// probability `2 * n_clusters * cost(x) / total_cost`. The candidates are weighted by the number
/// of observations closest to them and reduced with a weighted K-means++. If fewer candidates
/// than clusters are found, plain K-means++ over all observations is used.
fn k_means_para<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let n_samples = observations.nrows();
    let oversample_factor = F::cast(2 * n_clusters);

    let mut candidates = vec![rng.gen_range(0..n_samples)];
    let mut costs: Array1<F> = Array1::zeros(n_samples);
    update_min_dists(
        &observations.select(Axis(0), &candidates),
        &observations,
        &mut costs,
    );

    for round in 0..PARA_ROUNDS {
        let total_cost = costs.sum();
        if total_cost <= F::zero() {
            break;
        }

        let new_candidates = costs
            .iter()
            .enumerate()
            .filter(|(_, &cost)| {
                let probability = oversample_factor * cost / total_cost;
                F::cast(rng.gen::<f64>()) < probability
            })
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        trace!(round, new_candidates = new_candidates.len(), "k-means|| round");
        if new_candidates.is_empty() {
            continue;
        }

        let mut new_costs: Array1<F> = Array1::zeros(n_samples);
        update_min_dists(
            &observations.select(Axis(0), &new_candidates),
            &observations,
            &mut new_costs,
        );
        costs.zip_mut_with(&new_costs, |cost, &new| {
            if new < *cost {
                *cost = new
            }
        });
        candidates.extend(new_candidates);
    }

    if candidates.len() < n_clusters {
        return k_means_plusplus(n_clusters, observations, rng);
    }

    let candidates = observations.select(Axis(0), &candidates);

    // weight every candidate with the number of observations it is closest to
    let mut weights: Array1<F> = Array1::zeros(candidates.nrows());
    for observation in observations.rows() {
        let (closest, _) = closest_centroid(&candidates, &observation);
        weights[closest] += F::one();
    }

    weighted_k_means_plusplus(n_clusters, candidates.view(), &weights, rng)
}
