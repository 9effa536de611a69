use kelbow::ParamGuard;
use kelbow_clustering::{ClusterSweep, KMeans, KMeansError, KMeansParamsError};
use ndarray::array;

#[test]
fn n_clusters_cannot_be_zero() {
    assert!(KMeans::<f64>::params(0).check().is_err());
}

#[test]
fn tolerance_has_to_positive() {
    assert!(KMeans::params(1).tolerance(-1.).check().is_err());
}

#[test]
fn tolerance_cannot_be_zero() {
    assert!(KMeans::params(1).tolerance(0.).check().is_err());
}

#[test]
fn max_n_iterations_cannot_be_zero() {
    assert!(KMeans::params(1)
        .tolerance(1.)
        .max_n_iterations(0)
        .check()
        .is_err());
}

#[test]
fn sweep_reports_the_invalid_candidate() {
    let records = array![[0., 1.], [1., 0.]];
    let res = ClusterSweep::new(vec![1, 2, 0])
        .max_n_iterations(3)
        .run(&records);
    assert!(matches!(
        res,
        Err(KMeansError::InvalidParams(KMeansParamsError::NClusters))
    ));
}
