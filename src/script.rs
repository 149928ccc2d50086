//! Render job scripts, submission scripts and the wrapper
//!
//! The traits here are the seams between the orchestrator and the text it produces. The
//! default implementation of all of them is [templates::Templates].

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::script::writer::ScriptWriter;

/// Render script text from embedded TinyTemplate templates
pub mod templates;
/// Scoped text sinks for generated scripts
pub mod writer;

/// Write the body of a job script for one pipeline stage
pub trait ScriptGenerator<O> {
    fn write_body(&self, out: &mut ScriptWriter, options: &O) -> Result<()>;
}

/// Write the PBS directives that open every job script
pub trait HeaderWriter {
    fn write_header(&self, out: &mut ScriptWriter, job_name: &str, log_path: &Path, storage: &[String]) -> Result<()>;
}

/// One `qsub` call in a submission script
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub job_name: String,
    pub script: PathBuf,
    /// Shell variable receiving the job ID assigned by PBS
    pub capture: String,
    /// Capture variables of the jobs that must succeed first
    pub after: Vec<String>,
}

/// Write per-dataset submission scripts and the wrapper calling them
pub trait SubmissionWriter {
    fn write_submission(&self, out: &mut ScriptWriter, dataset: &str, submissions: &[Submission]) -> Result<()>;

    fn write_wrapper(&self, out: &mut ScriptWriter, scripts: &[PathBuf], output_dir: &Path) -> Result<()>;
}
