//! Turn one variable of one dataset into an ordered list of jobs
//!
//! The set of pipeline shapes is closed, so processors are variants of one enum rather than
//! trait objects. Every variant returns its jobs in creation order; the last job produces the
//! variable's [VariableProcessor::output_format]. Artifacts a processor doesn't produce itself
//! are resolved through the [DependencyRegistry], which must already hold their producers.

use std::path::PathBuf;
use std::rc::Rc;

use log::debug;

use crate::context::{Chunking, GenerationContext, GenerationOptions};
use crate::dataset::DatasetDescriptor;
use crate::error::Result;
use crate::job::artifact::{ArtifactKey, VariableId};
use crate::job::registry::DependencyRegistry;
use crate::job::task::Task;
use crate::job::{Job, JobSpec};
use crate::paths::PathKind;
use crate::variable::TargetVariable;

pub mod derive;
pub mod merge;
pub mod preprocess;
pub mod rechunk;

use derive::DeriveProcessor;
use merge::MergeProcessor;
use preprocess::PreprocessMergeProcessor;
use rechunk::RechunkProcessor;

#[derive(Clone, Debug, PartialEq)]
pub enum VariableProcessor {
    /// One merge job reading the raw files
    DirectMerge(MergeProcessor),
    /// Unpack the raw files, then merge the unpacked copies
    PreprocessMerge(PreprocessMergeProcessor),
    /// Compute the variable from other variables' time series
    Derive(DeriveProcessor),
    /// Any of the above followed by a rechunk job
    Rechunk(RechunkProcessor),
}

impl VariableProcessor {
    /// Pick the pipeline for a variable of a dataset
    pub fn select(target: &TargetVariable, dataset: &dyn DatasetDescriptor, options: &GenerationOptions) -> Self {
        let base = match &target.derive {
            Some(derivation) => VariableProcessor::Derive(DeriveProcessor::new(target.id.clone(), derivation)),
            None if dataset.requires_unpack(&target.id) => {
                VariableProcessor::PreprocessMerge(PreprocessMergeProcessor::new(target.id.clone()))
            }
            None => VariableProcessor::DirectMerge(MergeProcessor::new(target.id.clone())),
        };
        match options.rechunk {
            Some(chunking) => VariableProcessor::rechunked(base, chunking),
            None => base,
        }
    }

    /// Append a rechunk job to a pipeline, leaving already rechunked pipelines alone
    pub fn rechunked(self, chunking: Chunking) -> Self {
        match self {
            VariableProcessor::Rechunk(_) => self,
            base => VariableProcessor::Rechunk(RechunkProcessor::new(base, chunking)),
        }
    }

    pub fn target_variable(&self) -> &VariableId {
        match self {
            VariableProcessor::DirectMerge(p) => p.target_variable(),
            VariableProcessor::PreprocessMerge(p) => p.target_variable(),
            VariableProcessor::Derive(p) => p.target_variable(),
            VariableProcessor::Rechunk(p) => p.target_variable(),
        }
    }

    /// Artifact produced by the last job
    pub fn output_format(&self) -> ArtifactKey {
        match self {
            VariableProcessor::DirectMerge(p) => p.output_format(),
            VariableProcessor::PreprocessMerge(p) => p.output_format(),
            VariableProcessor::Derive(p) => p.output_format(),
            VariableProcessor::Rechunk(p) => p.output_format(),
        }
    }

    /// Artifacts produced by every job but the last
    pub fn intermediate_outputs(&self) -> Vec<ArtifactKey> {
        match self {
            VariableProcessor::DirectMerge(_) => Vec::new(),
            VariableProcessor::PreprocessMerge(p) => p.intermediate_outputs(),
            VariableProcessor::Derive(_) => Vec::new(),
            VariableProcessor::Rechunk(p) => p.intermediate_outputs(),
        }
    }

    /// Artifacts needed as input but produced by other processors
    pub fn dependencies(&self) -> Vec<ArtifactKey> {
        match self {
            VariableProcessor::DirectMerge(_) | VariableProcessor::PreprocessMerge(_) => Vec::new(),
            VariableProcessor::Derive(p) => p.dependencies(),
            VariableProcessor::Rechunk(p) => p.dependencies(),
        }
    }

    pub fn create_jobs(
        &self,
        dataset: &dyn DatasetDescriptor,
        ctx: &GenerationContext,
        registry: &DependencyRegistry,
    ) -> Result<Vec<Rc<Job>>> {
        match self {
            VariableProcessor::DirectMerge(p) => p.create_jobs(dataset, ctx),
            VariableProcessor::PreprocessMerge(p) => p.create_jobs(dataset, ctx),
            VariableProcessor::Derive(p) => p.create_jobs(dataset, ctx, registry),
            VariableProcessor::Rechunk(p) => p.create_jobs(dataset, ctx, registry),
        }
    }
}

/// Create a job whose script and log live in the dataset's script and log directories
fn create_job(
    ctx: &GenerationContext,
    dataset: &dyn DatasetDescriptor,
    variable_name: &str,
    output: ArtifactKey,
    output_path: PathBuf,
    dependencies: Vec<Rc<Job>>,
    task: Task,
) -> Rc<Job> {
    let spec = JobSpec {
        dataset: dataset.name().to_string(),
        variable_name: variable_name.to_string(),
        output,
        output_path,
        dependencies,
        task,
    };
    let job = Job::new(
        spec,
        &ctx.paths.dataset_dir(PathKind::Scripts, dataset.name()),
        &ctx.paths.dataset_dir(PathKind::Logs, dataset.name()),
    );
    debug!("Created job {} producing {}", job.name(), job.output());
    job
}
