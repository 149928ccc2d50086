//! Generate PBS job scripts that turn raw climate data into analysis-ready time series
//!
//! A configuration names target variables and datasets. For each dataset, every variable becomes
//! a small pipeline of jobs (unpack, merge, rechunk, derive), each written as a PBS script. A
//! per-dataset submission script submits the jobs in dependency order, and a wrapper script
//! runs every submission script.

/// Load and validate the JSON configuration
pub mod config;
/// Collaborators and options passed to processors and the orchestrator
pub mod context;
/// Datasets and the raw files they hold
pub mod dataset;
/// Errors raised while generating scripts
pub mod error;
/// Jobs, artifacts and the dependency registry
pub mod job;
/// Build, order and write every script of a dataset
pub mod orchestrator;
/// Where scripts, logs and artifacts live
pub mod paths;
/// Per-variable pipeline shapes
pub mod processor;
/// PBS queues
pub mod queue;
/// Script text and the sinks it's written to
pub mod script;
/// Target variables, units and interpolation
pub mod variable;

pub use config::Config;
pub use context::{Collaborators, GenerationContext};
pub use error::{Error, Result};
pub use orchestrator::ScriptOrchestrator;
