use super::{DatasetBase, Records};
use ndarray::{ArrayBase, Data, Dimension};

/// Implement records for NdArrays
///
/// A matrix holds one observation per row, a one-dimensional array is a single observation.
impl<F, S: Data<Elem = F>, I: Dimension> Records for ArrayBase<S, I> {
    type Elem = F;

    fn nsamples(&self) -> usize {
        match self.shape() {
            [] => 0,
            [_] => 1,
            [nsamples, ..] => *nsamples,
        }
    }

    fn nfeatures(&self) -> usize {
        match self.shape() {
            [] => 0,
            [nfeatures] => *nfeatures,
            [_, nfeatures, ..] => *nfeatures,
        }
    }
}

/// Implement records for a DatasetBase
impl<F, D: Records<Elem = F>, T> Records for DatasetBase<D, T> {
    type Elem = F;

    fn nsamples(&self) -> usize {
        self.records.nsamples()
    }

    fn nfeatures(&self) -> usize {
        self.records.nfeatures()
    }
}

/// Implement records for references
impl<R: Records> Records for &R {
    type Elem = R::Elem;

    fn nsamples(&self) -> usize {
        (*self).nsamples()
    }

    fn nfeatures(&self) -> usize {
        (*self).nfeatures()
    }
}
