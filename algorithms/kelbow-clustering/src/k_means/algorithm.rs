use crate::k_means::{KMeansError, KMeansParams, KMeansValidParams};
use kelbow::traits::{Fit, PredictInplace, Transformer};
use kelbow::{DatasetBase, Float};
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, DataMut, Ix1, Ix2, Zip};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use tracing::{debug, trace};

#[derive(Clone, Debug, PartialEq)]
/// K-means clustering aims to partition a set of unlabeled observations into clusters,
/// where each observation belongs to the cluster with the nearest mean.
///
/// The mean of the points within a cluster is called *centroid*.
///
/// Given the set of centroids, you can assign an observation to a cluster
/// choosing the nearest centroid.
///
/// We provide the _standard algorithm_ (also known as Lloyd's Algorithm). A cluster which loses
/// all of its observations during an iteration keeps its previous centroid.
///
/// More details on the algorithm can be found in the next section or
/// [here](https://en.wikipedia.org/wiki/K-means_clustering).
///
/// ## The algorithm
///
/// K-means is an iterative algorithm: it progressively refines the choice of centroids.
///
/// It's guaranteed to converge, even though it might not find the optimal set of centroids
/// (unfortunately it can get stuck in a local minimum, finding the optimal minimum if NP-hard!).
///
/// There are three steps in the standard algorithm:
/// - initialisation step: select initial centroids using one of our provided algorithms.
/// - assignment step: assign each observation to the nearest cluster
///                    (minimum distance between the observation and the cluster's centroid);
/// - update step: recompute the centroid of each cluster.
///
/// The initialisation step is a one-off, done at the very beginning.
/// Assignment and update are repeated in a loop until convergence is reached (either the
/// squared euclidean distance between the old and the new clusters is below `tolerance` or
/// we exceed the `max_n_iterations`).
///
/// ## Parallelisation
///
/// The work performed by the assignment step does not require any coordination:
/// the closest centroid for each point can be computed independently from the
/// closest centroid for any of the remaining points.
///
/// This makes it a good candidate for parallel execution: `KMeans::fit` parallelises the
/// assignment step thanks to the `rayon` feature in `ndarray`. Run the fit inside
/// [`Session::install`](kelbow::session::Session::install) to choose the thread pool.
///
/// The update step is executed on a single thread.
///
/// ## Tutorial
///
/// Let's do a walkthrough of a training-predict example.
///
/// ```
/// use kelbow::DatasetBase;
/// use kelbow::traits::{Fit, Predict};
/// use kelbow_clustering::KMeans;
/// use kelbow_datasets::generate;
/// use ndarray::{Axis, array};
/// use ndarray_rand::rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
/// use approx::assert_abs_diff_eq;
///
/// // Our random number generator, seeded for reproducibility
/// let mut rng = Xoshiro256Plus::seed_from_u64(42);
///
/// // `expected_centroids` has shape `(n_centroids, n_features)`
/// // i.e. three points in the 2-dimensional plane
/// let expected_centroids = array![[0., 1.], [-10., 20.], [-1., 10.]];
/// // Let's generate a synthetic dataset: three blobs of observations
/// // (100 points each) centered around our `expected_centroids`
/// let data = generate::blobs(100, &expected_centroids, &mut rng);
/// let n_clusters = expected_centroids.len_of(Axis(0));
///
/// let observations = DatasetBase::from(data);
/// // Let's configure and run our K-means algorithm
/// // We use the builder pattern to specify the hyperparameters
/// // `n_clusters` is the only mandatory parameter.
/// // If you don't specify the others (e.g. `n_runs`, `tolerance`, `max_n_iterations`)
/// // default values will be used.
/// let model = KMeans::params_with_rng(n_clusters, rng.clone())
///     .tolerance(1e-2)
///     .fit(&observations)
///     .expect("KMeans fitted");
///
/// // Once we found our set of centroids, we can also assign new points to the nearest cluster
/// let new_observation = DatasetBase::from(array![[-9., 20.5]]);
/// // Predict returns the **index** of the nearest cluster
/// let dataset = model.predict(new_observation);
/// // We can retrieve the actual centroid of the closest cluster using `.centroids()`
/// let closest_centroid = &model.centroids().index_axis(Axis(0), dataset.targets()[0]);
/// assert_abs_diff_eq!(closest_centroid.to_owned(), &array![-10., 20.], epsilon = 1e-1);
/// ```
pub struct KMeans<F: Float> {
    centroids: Array2<F>,
    cost: F,
    n_iterations: u64,
}

impl<F: Float> KMeans<F> {
    pub fn params(nclusters: usize) -> KMeansParams<F, Xoshiro256Plus> {
        KMeansParams::new(nclusters, Xoshiro256Plus::seed_from_u64(42))
    }

    pub fn params_with_rng<R: Rng>(nclusters: usize, rng: R) -> KMeansParams<F, R> {
        KMeansParams::new(nclusters, rng)
    }

    /// Model with the given centroids, as restored from storage
    pub(crate) fn from_parts(centroids: Array2<F>, cost: F, n_iterations: u64) -> Self {
        KMeans {
            centroids,
            cost,
            n_iterations,
        }
    }

    /// Return the set of centroids as a 2-dimensional matrix with shape
    /// `(n_centroids, n_features)`.
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    pub fn nfeatures(&self) -> usize {
        self.centroids.ncols()
    }

    /// Return the sum of squared distances between each training point and its closest
    /// centroid.
    pub fn cost(&self) -> F {
        self.cost
    }

    /// Number of Lloyd iterations the returned run performed
    pub fn n_iterations(&self) -> u64 {
        self.n_iterations
    }

    /// Index of the closest cluster of a single observation
    pub fn predict_point(
        &self,
        observation: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<usize, KMeansError> {
        self.check_features(observation.len())?;
        Ok(closest_centroid(&self.centroids, observation).0)
    }

    /// Sum of squared distances of `observations` to their closest centroid
    pub fn compute_cost<DA: Data<Elem = F>>(
        &self,
        observations: &ArrayBase<DA, Ix2>,
    ) -> Result<F, KMeansError> {
        self.check_features(observations.ncols())?;
        Ok(self.transform(observations).sum())
    }

    fn check_features(&self, found: usize) -> Result<(), KMeansError> {
        if found != self.nfeatures() {
            return Err(KMeansError::DimensionMismatch {
                expected: self.nfeatures(),
                found,
            });
        }
        Ok(())
    }
}

impl<F: Float, R: Rng + Clone, DA: Data<Elem = F>, T> Fit<ArrayBase<DA, Ix2>, T, KMeansError>
    for KMeansValidParams<F, R>
{
    type Object = KMeans<F>;

    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `fit` identifies `n_clusters` centroids based on the training data distribution.
    ///
    /// An instance of `KMeans` is returned.
    ///
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<DA, Ix2>, T>,
    ) -> Result<Self::Object, KMeansError> {
        let observations = dataset.records().view();
        let (n_samples, n_features) = observations.dim();
        if n_samples == 0 || n_samples < self.n_clusters() {
            return Err(KMeansError::NotEnoughSamples {
                n_clusters: self.n_clusters(),
                nsamples: n_samples,
            });
        }
        if let crate::KMeansInit::Precomputed(centroids) = self.init_method() {
            if centroids.ncols() != n_features {
                return Err(KMeansError::DimensionMismatch {
                    expected: centroids.ncols(),
                    found: n_features,
                });
            }
        }

        let mut rng = self.rng().clone();
        let mut best: Option<KMeans<F>> = None;
        let mut memberships: Array1<usize> = Array1::zeros(n_samples);
        let mut dists: Array1<F> = Array1::zeros(n_samples);

        for run in 0..self.n_runs() {
            let mut centroids = self
                .init_method()
                .run(self.n_clusters(), observations, &mut rng);
            let mut n_iterations = 0;
            for n_iter in 0..self.max_n_iterations() {
                update_cluster_memberships(&centroids, &observations, &mut memberships);
                let new_centroids = compute_centroids(&centroids, &observations, &memberships);
                let shift = (&centroids - &new_centroids).mapv(|d| d * d).sum();
                centroids = new_centroids;
                n_iterations = n_iter + 1;
                trace!(run, iteration = n_iterations, shift = %shift, "k-means iteration");
                if shift < self.tolerance() {
                    break;
                }
            }

            // The cost of a run is measured against its final centroids
            update_min_dists(&centroids, &observations, &mut dists);
            let cost = dists.sum();
            debug!(run, n_iterations, cost = %cost, "k-means run finished");

            // We keep the centroids which minimize the cost (defined as the sum of
            // the squared distances of the closest centroid for all observations)
            // over the n runs of the KMeans algorithm.
            if best.as_ref().map_or(true, |model| cost < model.cost) {
                best = Some(KMeans {
                    centroids,
                    cost,
                    n_iterations,
                });
            }
        }

        best.ok_or(KMeansError::InvalidParams(crate::KMeansParamsError::NRuns))
    }
}

impl<F: Float, DA: Data<Elem = F>> Transformer<&ArrayBase<DA, Ix2>, Array1<F>> for KMeans<F> {
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `transform` returns, for each observation, its squared distance to its centroid.
    fn transform(&self, observations: &ArrayBase<DA, Ix2>) -> Array1<F> {
        let mut dists = Array1::zeros(observations.nrows());
        update_min_dists(&self.centroids, &observations.view(), &mut dists);
        dists
    }
}

impl<F: Float, DA: Data<Elem = F>> PredictInplace<ArrayBase<DA, Ix2>, Array1<usize>>
    for KMeans<F>
{
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `predict` returns, for each observation, the index of the closest cluster/centroid.
    /// Memberships are returned in the order of the observations.
    ///
    /// You can retrieve the centroid associated to an index using the
    /// [`centroids` method](#method.centroids).
    fn predict_inplace(&self, observations: &ArrayBase<DA, Ix2>, memberships: &mut Array1<usize>) {
        assert_eq!(
            observations.nrows(),
            memberships.len(),
            "The number of data points must match the number of memberships."
        );
        assert_eq!(
            observations.ncols(),
            self.nfeatures(),
            "The observations must have as many features as the centroids."
        );

        update_cluster_memberships(&self.centroids, &observations.view(), memberships);
    }

    fn default_target(&self, x: &ArrayBase<DA, Ix2>) -> Array1<usize> {
        Array1::zeros(x.nrows())
    }
}

impl<F: Float, DA: Data<Elem = F>> PredictInplace<ArrayBase<DA, Ix1>, usize> for KMeans<F> {
    /// Given one input observation, return the index of its closest cluster
    ///
    /// You can retrieve the centroid associated to an index using the
    /// [`centroids` method](#method.centroids).
    fn predict_inplace(&self, observation: &ArrayBase<DA, Ix1>, membership: &mut usize) {
        assert_eq!(
            observation.len(),
            self.nfeatures(),
            "The observation must have as many features as the centroids."
        );
        *membership = closest_centroid(&self.centroids, observation).0;
    }

    fn default_target(&self, _x: &ArrayBase<DA, Ix1>) -> usize {
        0
    }
}

/// K-means is an iterative algorithm.
/// We will perform the assignment and update steps until we are satisfied
/// (according to our convergence criteria).
///
/// `compute_centroids` returns a 2-dimensional array,
/// where the i-th row corresponds to the i-th cluster. Clusters without observations keep
/// their old centroid.
fn compute_centroids<F: Float>(
    old_centroids: &Array2<F>,
    // (n_observations, n_features)
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_observations,)
    cluster_memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Array2<F> {
    let n_clusters = old_centroids.nrows();
    let mut counts: Array1<usize> = Array1::zeros(n_clusters);
    let mut centroids = Array2::zeros((n_clusters, observations.ncols()));

    Zip::from(observations.rows())
        .and(cluster_memberships)
        .for_each(|observation, &cluster_membership| {
            let mut centroid = centroids.row_mut(cluster_membership);
            centroid += &observation;
            counts[cluster_membership] += 1;
        });

    Zip::from(centroids.rows_mut())
        .and(old_centroids.rows())
        .and(&counts)
        .for_each(|mut centroid, old_centroid, &cnt| {
            if cnt == 0 {
                centroid.assign(&old_centroid);
            } else {
                centroid /= F::cast(cnt);
            }
        });
    centroids
}

// Update `cluster_memberships` with the index of the cluster each observation belongs to.
pub(crate) fn update_cluster_memberships<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    cluster_memberships: &mut ArrayBase<impl DataMut<Elem = usize>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(cluster_memberships)
        .par_for_each(|observation, cluster_membership| {
            *cluster_membership = closest_centroid(centroids, &observation).0
        });
}

// Updates `dists` with the squared distance of each observation from its closest centroid.
pub(crate) fn update_min_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    dists: &mut ArrayBase<impl DataMut<Elem = F>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(dists)
        .par_for_each(|observation, dist| *dist = closest_centroid(centroids, &observation).1);
}

/// Given a matrix of centroids with shape (n_centroids, n_features) and an observation,
/// return the index of the closest centroid (the index of the corresponding row in `centroids`)
/// and the squared distance to it. Ties are resolved in favour of the lowest index.
pub(crate) fn closest_centroid<F: Float>(
    // (n_centroids, n_features)
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_features)
    observation: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> (usize, F) {
    let mut iterator = centroids.rows().into_iter().enumerate();

    let (mut closest_index, mut minimum_distance) = match iterator.next() {
        Some((_, first_centroid)) => (0, squared_distance(first_centroid, observation.view())),
        None => return (0, F::infinity()),
    };

    for (centroid_index, centroid) in iterator {
        let distance = squared_distance(centroid, observation.view());
        if distance < minimum_distance {
            closest_index = centroid_index;
            minimum_distance = distance;
        }
    }
    (closest_index, minimum_distance)
}

fn squared_distance<F: Float>(a: ArrayView1<F>, b: ArrayView1<F>) -> F {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
