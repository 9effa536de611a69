//! Console report of a workflow run
use kelbow::summary::{DisplayVector, MultivariateSummary};
use kelbow_clustering::SweepResults;
use ndarray::{Array1, Array2};
use std::fmt;
use std::path::PathBuf;

/// Everything a successful run produced
#[derive(Clone, Debug)]
pub struct WorkflowReport {
    /// First raw input rows
    pub preview: Vec<String>,
    pub raw_summary: MultivariateSummary<f64>,
    pub scaled_summary: MultivariateSummary<f64>,
    pub sample_size: usize,
    pub sweep: SweepResults<f64>,
    pub suggested_k: Option<usize>,
    /// Number of clusters of the final model
    pub n_clusters: usize,
    /// Cost of the final model on the full scaled dataset
    pub cost: f64,
    /// Cost of the final model on the sweep sample
    pub sample_cost: f64,
    pub n_iterations: u64,
    /// Example point in original units
    pub point: Array1<f64>,
    pub prediction: usize,
    pub memberships: Array1<usize>,
    pub centroids: Array2<f64>,
    pub model_dir: PathBuf,
    pub reloaded_prediction: usize,
}

impl fmt::Display for WorkflowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source Data")?;
        for line in &self.preview {
            writeln!(f, "{}", line)?;
        }

        writeln!(f, "Summary Statistics (No Scaling) : ")?;
        writeln!(f, "{}", self.raw_summary)?;
        writeln!(f, "Statistics after scaling :")?;
        writeln!(f, "{}", self.scaled_summary)?;

        writeln!(f, "Sweep over a sample of {} observations", self.sample_size)?;
        write!(f, "{}", self.sweep)?;
        if let Some(k) = self.suggested_k {
            writeln!(f, "Elbow of the sweep : k={}", k)?;
        }

        writeln!(
            f,
            "Final model : k={} after {} iterations",
            self.n_clusters, self.n_iterations
        )?;
        writeln!(f, "Total cost {}", self.cost)?;
        writeln!(f, "Total cost on the sample {}", self.sample_cost)?;

        writeln!(
            f,
            "Predicting a point. Input Data :{} : ",
            DisplayVector(self.point.view())
        )?;
        writeln!(f, "Predicted Cluster : {}", self.prediction)?;
        writeln!(f, "Predicting a bunch of points... :")?;
        for membership in &self.memberships {
            writeln!(f, "Predicted Cluster : {}", membership)?;
        }

        writeln!(f, "Centers : ")?;
        for center in self.centroids.rows() {
            writeln!(f, "Center : {}", DisplayVector(center))?;
        }

        writeln!(f, "Model saved to {}", self.model_dir.display())?;
        writeln!(
            f,
            "Saved Model Predicted Cluster : {}",
            self.reloaded_prediction
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kelbow::summary::ColumnSummary;
    use kelbow_clustering::ClusterSweep;
    use ndarray::array;

    #[test]
    fn report_lists_every_section() {
        let records = array![[1., 2.], [3., 4.], [5., 7.]];
        let summary = records.summary().unwrap();
        let sweep = ClusterSweep::new(vec![1, 2]).run(&records).unwrap();

        let report = WorkflowReport {
            preview: vec!["1,2".to_string(), "3,4".to_string()],
            raw_summary: summary.clone(),
            scaled_summary: summary,
            sample_size: 3,
            sweep,
            suggested_k: None,
            n_clusters: 2,
            cost: 1.5,
            sample_cost: 1.5,
            n_iterations: 2,
            point: array![1., 2.],
            prediction: 0,
            memberships: array![0, 0, 1],
            centroids: array![[2., 3.], [5., 7.]],
            model_dir: PathBuf::from("MyModel"),
            reloaded_prediction: 0,
        }
        .to_string();

        assert!(report.starts_with("Source Data\n1,2\n3,4\n"));
        assert!(report.contains(" Mean : [3,"));
        assert!(report.contains("when k=2 -> "));
        assert!(report.contains("Predicting a point. Input Data :[1,2] : "));
        assert_eq!(report.matches("\nPredicted Cluster : ").count(), 4);
        assert!(report.contains("Center : [5,7]"));
        assert!(report.ends_with("Saved Model Predicted Cluster : 0\n"));
    }
}
