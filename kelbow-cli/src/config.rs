//! Command line options and the validated workflow configuration
use crate::pipeline::WorkflowError;
use kelbow_clustering::SavePolicy;
use std::path::PathBuf;
use structopt::StructOpt;

/// Number of raw input rows shown before parsing
pub const PREVIEW_LINES: usize = 10;

/// Cluster the rows of a comma separated file with K-means
///
/// The features are standardized, a sample of the data is used to sweep candidate cluster
/// counts, and the final model is trained on all rows, stored and reloaded.
#[derive(Debug, StructOpt)]
#[structopt(name = "kelbow")]
pub struct Options {
    /// Comma separated data file, one observation per line
    #[structopt(parse(from_os_str))]
    pub input: PathBuf,
    /// Number of clusters of the final model
    #[structopt(short = "k", long = "clusters", default_value = "3")]
    pub clusters: usize,
    /// Pick the final number of clusters with the elbow heuristic
    #[structopt(long = "auto-k")]
    pub auto_k: bool,
    /// Candidate numbers of clusters for the sweep
    #[structopt(long = "sweep", default_value = "1,2,3,4,5,6,7,8,9")]
    pub sweep: String,
    /// Iteration budget of every K-means training
    #[structopt(long = "max-iterations", default_value = "5")]
    pub max_iterations: u64,
    /// Fraction of the observations used for the sweep
    #[structopt(long = "sample-fraction", default_value = "0.2")]
    pub sample_fraction: f64,
    /// Sample with replacement
    #[structopt(long = "with-replacement")]
    pub with_replacement: bool,
    /// Base seed of sampling and training, random when omitted
    #[structopt(long = "seed")]
    pub seed: Option<u64>,
    /// Number of features of every observation
    #[structopt(long = "features", default_value = "4")]
    pub features: usize,
    /// Observation whose cluster is predicted, in original units
    #[structopt(long = "point", default_value = "4.9,3.5,1.4,0.2")]
    pub point: String,
    /// Directory the model is stored in
    #[structopt(long = "model-dir", default_value = "MyModel", parse(from_os_str))]
    pub model_dir: PathBuf,
    /// Replace a model stored at `--model-dir`
    #[structopt(long = "overwrite")]
    pub overwrite: bool,
    /// Number of worker threads
    #[structopt(long = "threads")]
    pub threads: Option<usize>,
}

/// Everything a workflow run needs to know
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowConfig {
    pub input: PathBuf,
    pub n_clusters: usize,
    pub auto_k: bool,
    pub sweep: Vec<usize>,
    pub max_iterations: u64,
    pub sample_fraction: f64,
    pub with_replacement: bool,
    pub seed: Option<u64>,
    pub n_features: usize,
    pub point: Vec<f64>,
    pub model_dir: PathBuf,
    pub save_policy: SavePolicy,
    pub n_threads: Option<usize>,
}

impl WorkflowConfig {
    /// Configuration with the command line defaults
    pub fn new<P: Into<PathBuf>>(input: P) -> Self {
        WorkflowConfig {
            input: input.into(),
            n_clusters: 3,
            auto_k: false,
            sweep: (1..=9).collect(),
            max_iterations: 5,
            sample_fraction: 0.2,
            with_replacement: false,
            seed: None,
            n_features: 4,
            point: vec![4.9, 3.5, 1.4, 0.2],
            model_dir: PathBuf::from("MyModel"),
            save_policy: SavePolicy::FailIfExists,
            n_threads: None,
        }
    }

    /// Checks every setting which can be checked without looking at the data
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let invalid = |msg: String| Err(WorkflowError::InvalidConfig(msg));

        if self.n_clusters == 0 {
            return invalid("the number of clusters must be positive".to_string());
        }
        if self.sweep.is_empty() {
            return invalid("the sweep needs at least one candidate".to_string());
        }
        if self.sweep.contains(&0) {
            return invalid("every sweep candidate must be positive".to_string());
        }
        if self.max_iterations == 0 {
            return invalid("the iteration budget must be positive".to_string());
        }
        let fraction_ok = if self.with_replacement {
            self.sample_fraction > 0. && self.sample_fraction.is_finite()
        } else {
            self.sample_fraction > 0. && self.sample_fraction <= 1.
        };
        if !fraction_ok {
            return invalid(format!(
                "sample fraction {} is out of range",
                self.sample_fraction
            ));
        }
        if self.n_features == 0 {
            return invalid("the number of features must be positive".to_string());
        }
        if self.point.len() != self.n_features {
            return invalid(format!(
                "the example point has {} values, expected {}",
                self.point.len(),
                self.n_features
            ));
        }
        if self.n_threads == Some(0) {
            return invalid("the number of threads must be positive".to_string());
        }

        Ok(())
    }
}

impl Options {
    /// Parses the list arguments and validates the result
    pub fn into_config(self) -> Result<WorkflowConfig, WorkflowError> {
        let sweep = self
            .sweep
            .split(',')
            .map(|field| field.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                WorkflowError::InvalidConfig(format!("invalid sweep `{}`: {}", self.sweep, err))
            })?;
        let point = kelbow_datasets::parse_vector(&self.point, self.features)
            .map_err(|err| {
                WorkflowError::InvalidConfig(format!("invalid point `{}`: {}", self.point, err))
            })?
            .to_vec();

        let config = WorkflowConfig {
            input: self.input,
            n_clusters: self.clusters,
            auto_k: self.auto_k,
            sweep,
            max_iterations: self.max_iterations,
            sample_fraction: self.sample_fraction,
            with_replacement: self.with_replacement,
            seed: self.seed,
            n_features: self.features,
            point,
            model_dir: self.model_dir,
            save_policy: if self.overwrite {
                SavePolicy::Overwrite
            } else {
                SavePolicy::FailIfExists
            },
            n_threads: self.threads,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> Result<WorkflowConfig, WorkflowError> {
        let mut argv = vec!["kelbow", "iris.data"];
        argv.extend_from_slice(args);
        Options::from_iter_safe(argv).unwrap().into_config()
    }

    #[test]
    fn defaults_match_the_command_line() {
        assert_eq!(config(&[]).unwrap(), WorkflowConfig::new("iris.data"));
    }

    #[test]
    fn options_are_parsed() {
        let config = config(&[
            "-k",
            "4",
            "--sweep",
            "2, 4,8",
            "--point",
            "1,2",
            "--features",
            "2",
            "--seed",
            "7",
            "--overwrite",
        ])
        .unwrap();
        assert_eq!(config.n_clusters, 4);
        assert_eq!(config.sweep, vec![2, 4, 8]);
        assert_eq!(config.point, vec![1., 2.]);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.save_policy, SavePolicy::Overwrite);
    }

    #[test]
    fn input_is_required() {
        assert!(Options::from_iter_safe(&["kelbow"]).is_err());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let cases: &[&[&str]] = &[
            &["-k", "0"],
            &["--sweep", "1,0,3"],
            &["--sweep", "1,x"],
            &["--max-iterations", "0"],
            &["--sample-fraction", "0"],
            &["--sample-fraction", "1.5"],
            &["--features", "3"],
            &["--point", "1,2,3,abc"],
            &["--threads", "0"],
        ];
        for args in cases {
            assert!(
                matches!(config(args), Err(WorkflowError::InvalidConfig(_))),
                "{:?} should be rejected",
                args
            );
        }
    }

    #[test]
    fn fraction_above_one_needs_replacement() {
        let config = config(&["--sample-fraction", "1.5", "--with-replacement"]).unwrap();
        assert!(config.with_replacement);
    }
}
