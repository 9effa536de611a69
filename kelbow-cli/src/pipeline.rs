//! The clustering workflow
//!
//! Every stage runs inside the thread pool of one [`Session`] and either hands its result to
//! the next stage or stops the workflow with a [`StageError`] naming the failed stage.
use crate::config::{WorkflowConfig, PREVIEW_LINES};
use crate::report::WorkflowReport;
use kelbow::session::Session;
use kelbow::summary::ColumnSummary;
use kelbow::traits::{Fit, Predict, Transformer};
use kelbow::Observations;
use kelbow_clustering::{ClusterSweep, KMeans, KMeansError};
use kelbow_datasets::{DatasetError, TextSource};
use kelbow_preprocessing::{PreprocessingError, StandardScaler};
use ndarray::Array1;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Random streams of a session, one per consumer
const SAMPLE_STREAM: u64 = 0;
const SWEEP_STREAM: u64 = 1;
const TRAIN_STREAM: u64 = 2;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The reloaded model disagrees with the trained one
    #[error("reloaded model disagrees with the trained model on {mismatches} predictions")]
    RoundTripMismatch { mismatches: usize },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Kelbow(#[from] kelbow::Error),
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),
    #[error(transparent)]
    Clustering(#[from] KMeansError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Configure,
    Load,
    Parse,
    Summarize,
    Scale,
    Sample,
    Sweep,
    Train,
    Predict,
    Persist,
    Reload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configure => "configure",
            Stage::Load => "load",
            Stage::Parse => "parse",
            Stage::Summarize => "summarize",
            Stage::Scale => "scale",
            Stage::Sample => "sample",
            Stage::Sweep => "sweep",
            Stage::Train => "train",
            Stage::Predict => "predict",
            Stage::Persist => "persist",
            Stage::Reload => "reload",
        };
        f.write_str(name)
    }
}

/// Failure of one workflow stage
#[derive(Error, Debug)]
#[error("stage `{stage}` failed")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: WorkflowError,
}

trait StageResult<T> {
    fn stage(self, stage: Stage) -> Result<T, StageError>;
}

impl<T, E: Into<WorkflowError>> StageResult<T> for Result<T, E> {
    fn stage(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|err| StageError {
            stage,
            source: err.into(),
        })
    }
}

/// Runs the whole workflow described by `config`
///
/// Nothing is read before the configuration passed validation, and the first failing stage
/// ends the run.
pub fn run(config: &WorkflowConfig) -> Result<WorkflowReport, StageError> {
    config.validate().stage(Stage::Configure)?;
    let session = Session::builder("kelbow")
        .n_threads(config.n_threads)
        .seed(config.seed)
        .build()
        .stage(Stage::Configure)?;

    let report = run_stages(config, &session);
    session.close();
    report
}

fn run_stages(config: &WorkflowConfig, session: &Session) -> Result<WorkflowReport, StageError> {
    info!(input = %config.input.display(), "loading input");
    let source = TextSource::open(&config.input).stage(Stage::Load)?;
    let preview = source.preview(PREVIEW_LINES);

    let records = source.parse(config.n_features).stage(Stage::Parse)?;
    let dataset = Observations::from(records);
    info!(
        nsamples = dataset.records().nrows(),
        nfeatures = config.n_features,
        "parsed input"
    );
    check_cluster_count(config.n_clusters, dataset.records().nrows())?;

    let raw_summary = session
        .install(|| dataset.summary())
        .stage(Stage::Summarize)?;

    let scaler = session
        .install(|| StandardScaler::params().fit(&dataset))
        .stage(Stage::Scale)?;
    let scaled: Observations<f64> = scaler.transform(dataset).stage(Stage::Scale)?;
    info!(means = ?scaler.means(), std_devs = ?scaler.std_devs(), "standardized features");

    let scaled_summary = session
        .install(|| scaled.summary())
        .stage(Stage::Summarize)?;

    let mut rng = session.rng(SAMPLE_STREAM);
    let sample = scaled
        .sample(config.with_replacement, config.sample_fraction, &mut rng)
        .stage(Stage::Sample)?;
    info!(
        sample_size = sample.records().nrows(),
        fraction = config.sample_fraction,
        "drew sweep sample"
    );

    let sweep = ClusterSweep::with_rng(config.sweep.clone(), session.rng(SWEEP_STREAM))
        .max_n_iterations(config.max_iterations);
    let sweep_results = session
        .install(|| sweep.run(sample.records()))
        .stage(Stage::Sweep)?;

    let suggested_k = sweep_results.suggest_elbow();
    let n_clusters = match (config.auto_k, suggested_k) {
        (true, Some(k)) => {
            info!(k, "using the elbow of the sweep");
            k
        }
        (true, None) => {
            warn!(
                k = config.n_clusters,
                "the sweep has too few candidates for an elbow, using the configured k"
            );
            config.n_clusters
        }
        (false, _) => config.n_clusters,
    };
    check_cluster_count(n_clusters, scaled.records().nrows())?;

    let model = session
        .install(|| {
            KMeans::params_with_rng(n_clusters, session.rng(TRAIN_STREAM))
                .max_n_iterations(config.max_iterations)
                .fit(&scaled)
        })
        .stage(Stage::Train)?;
    let cost = model.compute_cost(scaled.records()).stage(Stage::Train)?;
    let sample_cost = model.compute_cost(sample.records()).stage(Stage::Train)?;
    info!(
        k = n_clusters,
        cost,
        iterations = model.n_iterations(),
        "trained final model"
    );

    let point = Array1::from(config.point.clone());
    let scaled_point = scaler.transform(&point).stage(Stage::Predict)?;
    let prediction = model.predict_point(&scaled_point).stage(Stage::Predict)?;
    let memberships: Array1<usize> = session.install(|| model.predict(scaled.records()));

    model
        .save(&config.model_dir, config.save_policy)
        .stage(Stage::Persist)?;

    let reloaded = KMeans::<f64>::load(&config.model_dir).stage(Stage::Reload)?;
    let reloaded_prediction = reloaded
        .predict_point(&scaled_point)
        .stage(Stage::Reload)?;
    let reloaded_memberships: Array1<usize> = reloaded.predict(scaled.records());
    let mismatches = reloaded_memberships
        .iter()
        .zip(memberships.iter())
        .filter(|(a, b)| a != b)
        .count()
        + usize::from(reloaded_prediction != prediction);
    if mismatches > 0 {
        return Err(WorkflowError::RoundTripMismatch { mismatches }).stage(Stage::Reload);
    }

    Ok(WorkflowReport {
        preview,
        raw_summary,
        scaled_summary,
        sample_size: sample.records().nrows(),
        sweep: sweep_results,
        suggested_k,
        n_clusters,
        cost,
        sample_cost,
        n_iterations: model.n_iterations(),
        point,
        prediction,
        memberships,
        centroids: model.centroids().clone(),
        model_dir: config.model_dir.clone(),
        reloaded_prediction,
    })
}

fn check_cluster_count(n_clusters: usize, nsamples: usize) -> Result<(), StageError> {
    if n_clusters > nsamples {
        return Err(WorkflowError::InvalidConfig(format!(
            "{} clusters requested, but the input has only {} observations",
            n_clusters, nsamples
        )))
        .stage(Stage::Configure);
    }
    Ok(())
}
