//! The `kelbow` command line workflow
//!
//! [`Options`] are turned into a validated [`WorkflowConfig`], [`run`] executes the stages on a
//! session and returns a [`WorkflowReport`] which renders the console output.
pub mod config;
pub mod pipeline;
pub mod report;

pub use config::{Options, WorkflowConfig};
pub use pipeline::{run, Stage, StageError, WorkflowError};
pub use report::WorkflowReport;
