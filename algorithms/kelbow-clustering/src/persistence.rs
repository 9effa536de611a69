//! Model persistence
//!
//! A fitted [`KMeans`] model is stored as a directory holding two JSON documents:
//!
//! * `metadata.json` with the model class, the format version, the number of clusters and
//! features, the training cost and the number of iterations of the training run.
//! * `data.json` with one entry per centroid, `{"cluster_index": .., "center": [..]}`.
//!
//! Centroids are written with full precision, so a reloaded model predicts exactly like the
//! model which was saved.
use crate::k_means::{KMeans, KMeansError};
use kelbow::Float;
use ndarray::Array2;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Class tag written into the metadata of every stored model
pub const MODEL_CLASS: &str = "kelbow.clustering.KMeans";
/// Version of the storage layout
pub const FORMAT_VERSION: u32 = 1;

const METADATA_FILE: &str = "metadata.json";
const DATA_FILE: &str = "data.json";

/// What to do when the save location already holds something
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SavePolicy {
    /// Refuse to replace existing content. Saving a model identical to the stored one succeeds
    /// without touching the files.
    FailIfExists,
    /// Replace a model stored at the location. Content which is not a stored model is never
    /// removed.
    Overwrite,
}

impl Default for SavePolicy {
    fn default() -> Self {
        SavePolicy::FailIfExists
    }
}

#[derive(Serialize, Deserialize)]
struct Metadata<F> {
    class: String,
    format_version: u32,
    n_clusters: usize,
    n_features: usize,
    training_cost: F,
    n_iterations: u64,
}

#[derive(Deserialize)]
struct StoredClass {
    class: String,
}

#[derive(Serialize, Deserialize)]
struct Center<F> {
    cluster_index: usize,
    center: Vec<F>,
}

#[derive(Serialize, Deserialize)]
struct ModelData<F> {
    centers: Vec<Center<F>>,
}

impl<F: Float + Serialize + DeserializeOwned> KMeans<F> {
    /// Stores the model in the directory `location`
    ///
    /// Missing parent directories are created.
    pub fn save<P: AsRef<Path>>(&self, location: P, policy: SavePolicy) -> Result<(), KMeansError> {
        let location = location.as_ref();

        if location.exists() {
            match policy {
                SavePolicy::FailIfExists => {
                    return match Self::load(location) {
                        Ok(stored) if stored.centroids() == self.centroids() => {
                            info!(path = %location.display(), "identical model already stored");
                            Ok(())
                        }
                        Ok(_) | Err(KMeansError::CorruptModel(_)) => {
                            Err(KMeansError::ModelExists(location.to_path_buf()))
                        }
                        Err(err) => Err(err),
                    };
                }
                SavePolicy::Overwrite => {
                    if holds_model(location)? {
                        debug!(path = %location.display(), "removing existing model");
                        fs::remove_dir_all(location).map_err(|source| io_error(location, source))?;
                    } else if !is_empty_dir(location)? {
                        return Err(KMeansError::ModelExists(location.to_path_buf()));
                    }
                }
            }
        }

        let metadata = Metadata {
            class: MODEL_CLASS.to_string(),
            format_version: FORMAT_VERSION,
            n_clusters: self.n_clusters(),
            n_features: self.nfeatures(),
            training_cost: self.cost(),
            n_iterations: self.n_iterations(),
        };
        let data = ModelData {
            centers: self
                .centroids()
                .rows()
                .into_iter()
                .enumerate()
                .map(|(cluster_index, center)| Center {
                    cluster_index,
                    center: center.to_vec(),
                })
                .collect(),
        };

        fs::create_dir_all(location).map_err(|source| io_error(location, source))?;
        write_json(&location.join(METADATA_FILE), &metadata)?;
        write_json(&location.join(DATA_FILE), &data)?;

        info!(
            path = %location.display(),
            n_clusters = self.n_clusters(),
            "model saved"
        );
        Ok(())
    }

    /// Restores a model stored with [`KMeans::save`]
    pub fn load<P: AsRef<Path>>(location: P) -> Result<Self, KMeansError> {
        let location = location.as_ref();
        if !location.exists() {
            return Err(KMeansError::ModelNotFound(location.to_path_buf()));
        }
        if !location.is_dir() {
            return Err(corrupt(format!(
                "{} is not a model directory",
                location.display()
            )));
        }

        let metadata: Metadata<F> = read_json(&location.join(METADATA_FILE))?;
        if metadata.class != MODEL_CLASS {
            return Err(corrupt(format!("unexpected model class `{}`", metadata.class)));
        }
        if metadata.format_version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {}",
                metadata.format_version
            )));
        }
        if metadata.n_clusters == 0 || metadata.n_features == 0 {
            return Err(corrupt("model without clusters or features".to_string()));
        }

        let data: ModelData<F> = read_json(&location.join(DATA_FILE))?;
        if data.centers.len() != metadata.n_clusters {
            return Err(corrupt(format!(
                "metadata announces {} clusters, data holds {} centers",
                metadata.n_clusters,
                data.centers.len()
            )));
        }

        let mut centroids = Array2::zeros((metadata.n_clusters, metadata.n_features));
        let mut seen = vec![false; metadata.n_clusters];
        for Center {
            cluster_index,
            center,
        } in data.centers
        {
            if cluster_index >= metadata.n_clusters {
                return Err(corrupt(format!(
                    "cluster index {} out of range",
                    cluster_index
                )));
            }
            if seen[cluster_index] {
                return Err(corrupt(format!("duplicate cluster index {}", cluster_index)));
            }
            if center.len() != metadata.n_features {
                return Err(corrupt(format!(
                    "center {} has {} values, expected {}",
                    cluster_index,
                    center.len(),
                    metadata.n_features
                )));
            }
            if center.iter().any(|value| !value.is_finite()) {
                return Err(corrupt(format!(
                    "center {} holds non-finite values",
                    cluster_index
                )));
            }

            seen[cluster_index] = true;
            for (target, value) in centroids.row_mut(cluster_index).iter_mut().zip(center) {
                *target = value;
            }
        }

        debug!(path = %location.display(), n_clusters = metadata.n_clusters, "model loaded");
        Ok(KMeans::from_parts(
            centroids,
            metadata.training_cost,
            metadata.n_iterations,
        ))
    }
}

fn corrupt(reason: String) -> KMeansError {
    KMeansError::CorruptModel(reason)
}

fn io_error(path: &Path, source: io::Error) -> KMeansError {
    KMeansError::Io {
        path: PathBuf::from(path),
        source,
    }
}

/// Whether `location` is a directory whose metadata names a kelbow model
fn holds_model(location: &Path) -> Result<bool, KMeansError> {
    if !location.is_dir() {
        return Ok(false);
    }
    match read_json::<StoredClass>(&location.join(METADATA_FILE)) {
        Ok(stored) => Ok(stored.class == MODEL_CLASS),
        Err(KMeansError::CorruptModel(_)) => Ok(false),
        Err(err) => Err(err),
    }
}

fn is_empty_dir(location: &Path) -> Result<bool, KMeansError> {
    if !location.is_dir() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(location).map_err(|source| io_error(location, source))?;
    Ok(entries.next().is_none())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), KMeansError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| corrupt(format!("cannot encode {}: {}", path.display(), err)))?;
    fs::write(path, text).map_err(|source| io_error(path, source))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, KMeansError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(corrupt(format!("missing {}", path.display())))
        }
        Err(source) => return Err(io_error(path, source)),
    };
    serde_json::from_str(&text).map_err(|err| corrupt(format!("{}: {}", path.display(), err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kelbow::traits::{Fit, Predict};
    use kelbow::DatasetBase;
    use kelbow_datasets::generate;
    use ndarray::{array, Array1};
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;
    use serde_json::json;

    fn fitted_model(seed: u64) -> (KMeans<f64>, Array2<f64>) {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        let centroids = array![[0., 0.], [10., 10.], [-10., 10.]];
        let records = generate::blobs(40, &centroids, &mut rng);
        let model = KMeans::params_with_rng(3, rng)
            .fit(&DatasetBase::from(records.clone()))
            .unwrap();
        (model, records)
    }

    fn write_model(location: &Path, metadata: serde_json::Value, data: serde_json::Value) {
        fs::create_dir_all(location).unwrap();
        fs::write(location.join(METADATA_FILE), metadata.to_string()).unwrap();
        fs::write(location.join(DATA_FILE), data.to_string()).unwrap();
    }

    fn metadata(n_clusters: usize, n_features: usize) -> serde_json::Value {
        json!({
            "class": MODEL_CLASS,
            "format_version": FORMAT_VERSION,
            "n_clusters": n_clusters,
            "n_features": n_features,
            "training_cost": 1.5,
            "n_iterations": 3
        })
    }

    fn assert_corrupt(location: &Path) {
        let res = KMeans::<f64>::load(location);
        assert!(
            matches!(res, Err(KMeansError::CorruptModel(_))),
            "expected a corrupt model, got {:?}",
            res
        );
    }

    #[test]
    fn reloaded_model_predicts_identically() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("model");
        let (model, records) = fitted_model(42);

        model.save(&location, SavePolicy::default()).unwrap();
        assert!(location.join(METADATA_FILE).is_file());
        assert!(location.join(DATA_FILE).is_file());

        let reloaded = KMeans::<f64>::load(&location).unwrap();
        assert_eq!(reloaded, model);

        let expected: Array1<usize> = model.predict(&records);
        let found: Array1<usize> = reloaded.predict(&records);
        assert_eq!(found, expected);
    }

    #[test]
    fn f32_models_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let model = KMeans::from_parts(array![[0.1f32, 0.2], [1.0 / 3.0, 7.7]], 0.25, 4);
        model.save(dir.path(), SavePolicy::Overwrite).unwrap();
        assert_eq!(KMeans::<f32>::load(dir.path()).unwrap(), model);
    }

    #[test]
    fn saving_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("a").join("b").join("model");
        let (model, _) = fitted_model(1);
        model.save(&location, SavePolicy::FailIfExists).unwrap();
        assert!(KMeans::<f64>::load(&location).is_ok());
    }

    #[test]
    fn saving_the_same_model_twice_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("model");
        let (model, _) = fitted_model(42);
        model.save(&location, SavePolicy::FailIfExists).unwrap();
        model.save(&location, SavePolicy::FailIfExists).unwrap();
    }

    #[test]
    fn saving_a_different_model_fails_if_exists() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("model");
        let (first, _) = fitted_model(42);
        let second = KMeans::from_parts(array![[1., 2.]], 0., 1);

        first.save(&location, SavePolicy::FailIfExists).unwrap();
        let res = second.save(&location, SavePolicy::FailIfExists);
        assert!(matches!(res, Err(KMeansError::ModelExists(_))));
        assert_eq!(KMeans::<f64>::load(&location).unwrap(), first);
    }

    #[test]
    fn unrelated_content_is_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("notes.txt");
        fs::write(&location, "keep me").unwrap();

        let (model, _) = fitted_model(42);
        let res = model.save(&location, SavePolicy::FailIfExists);
        assert!(matches!(res, Err(KMeansError::ModelExists(_))));
        assert_eq!(fs::read_to_string(&location).unwrap(), "keep me");
    }

    #[test]
    fn overwrite_replaces_the_stored_model() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("model");
        let (first, _) = fitted_model(42);
        let second = KMeans::from_parts(array![[1., 2.]], 0., 1);

        first.save(&location, SavePolicy::FailIfExists).unwrap();
        second.save(&location, SavePolicy::Overwrite).unwrap();
        assert_eq!(KMeans::<f64>::load(&location).unwrap(), second);
    }

    #[test]
    fn overwrite_keeps_content_which_is_not_a_model() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("work");
        fs::create_dir_all(&location).unwrap();
        fs::write(location.join("thesis.tex"), "keep me").unwrap();
        let (model, _) = fitted_model(42);

        let res = model.save(&location, SavePolicy::Overwrite);
        assert!(matches!(res, Err(KMeansError::ModelExists(_))));
        assert_eq!(fs::read_to_string(location.join("thesis.tex")).unwrap(), "keep me");

        let file = dir.path().join("notes.txt");
        fs::write(&file, "keep me too").unwrap();
        let res = model.save(&file, SavePolicy::Overwrite);
        assert!(matches!(res, Err(KMeansError::ModelExists(_))));
        assert_eq!(fs::read_to_string(&file).unwrap(), "keep me too");
    }

    #[test]
    fn overwrite_keeps_models_of_another_class() {
        let dir = tempfile::tempdir().unwrap();
        let mut meta = metadata(1, 1);
        meta["class"] = json!("some.other.Model");
        write_model(
            dir.path(),
            meta,
            json!({"centers": [{"cluster_index": 0, "center": [1.0]}]}),
        );
        let (model, _) = fitted_model(42);

        let res = model.save(dir.path(), SavePolicy::Overwrite);
        assert!(matches!(res, Err(KMeansError::ModelExists(_))));
        assert!(dir.path().join(DATA_FILE).is_file());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_model_is_an_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("model");
        let (model, _) = fitted_model(42);
        model.save(&location, SavePolicy::FailIfExists).unwrap();

        let metadata_file = location.join(METADATA_FILE);
        fs::set_permissions(&metadata_file, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_to_string(&metadata_file).is_ok() {
            // running with privileges which ignore file modes
            return;
        }

        let res = model.save(&location, SavePolicy::FailIfExists);
        fs::set_permissions(&metadata_file, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(matches!(res, Err(KMeansError::Io { .. })), "got {:?}", res);
    }

    #[test]
    fn missing_model_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let res = KMeans::<f64>::load(dir.path().join("nothing"));
        assert!(matches!(res, Err(KMeansError::ModelNotFound(_))));
    }

    #[test]
    fn valid_files_load_in_any_center_order() {
        let dir = tempfile::tempdir().unwrap();
        write_model(
            dir.path(),
            metadata(2, 2),
            json!({"centers": [
                {"cluster_index": 1, "center": [3.0, 4.0]},
                {"cluster_index": 0, "center": [1.0, 2.0]}
            ]}),
        );
        let model = KMeans::<f64>::load(dir.path()).unwrap();
        assert_eq!(model.centroids(), &array![[1., 2.], [3., 4.]]);
        assert_eq!(model.n_iterations(), 3);
    }

    #[test]
    fn missing_files_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(METADATA_FILE), metadata(1, 1).to_string()).unwrap();
        assert_corrupt(dir.path());

        let dir = tempfile::tempdir().unwrap();
        assert_corrupt(dir.path());
    }

    #[test]
    fn invalid_json_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(METADATA_FILE), "{ not json").unwrap();
        fs::write(dir.path().join(DATA_FILE), "{}").unwrap();
        assert_corrupt(dir.path());
    }

    #[test]
    fn wrong_class_or_version_is_corrupt() {
        let centers = json!({"centers": [{"cluster_index": 0, "center": [1.0]}]});

        let dir = tempfile::tempdir().unwrap();
        let mut meta = metadata(1, 1);
        meta["class"] = json!("some.other.Model");
        write_model(dir.path(), meta, centers.clone());
        assert_corrupt(dir.path());

        let dir = tempfile::tempdir().unwrap();
        let mut meta = metadata(1, 1);
        meta["format_version"] = json!(FORMAT_VERSION + 1);
        write_model(dir.path(), meta, centers);
        assert_corrupt(dir.path());
    }

    #[test]
    fn inconsistent_centers_are_corrupt() {
        let cases = vec![
            // fewer centers than announced
            json!({"centers": [{"cluster_index": 0, "center": [1.0, 2.0]}]}),
            // duplicate index
            json!({"centers": [
                {"cluster_index": 0, "center": [1.0, 2.0]},
                {"cluster_index": 0, "center": [3.0, 4.0]}
            ]}),
            // out of range index
            json!({"centers": [
                {"cluster_index": 0, "center": [1.0, 2.0]},
                {"cluster_index": 2, "center": [3.0, 4.0]}
            ]}),
            // ragged
            json!({"centers": [
                {"cluster_index": 0, "center": [1.0, 2.0]},
                {"cluster_index": 1, "center": [3.0]}
            ]}),
            // non-numeric value
            json!({"centers": [
                {"cluster_index": 0, "center": [1.0, 2.0]},
                {"cluster_index": 1, "center": [3.0, null]}
            ]}),
        ];

        for data in cases {
            let dir = tempfile::tempdir().unwrap();
            write_model(dir.path(), metadata(2, 2), data);
            assert_corrupt(dir.path());
        }
    }
}
