//! Jobs are the unit of work submitted to PBS
//!
//! A job is one generated script: it produces exactly one artifact and may depend on jobs
//! producing its inputs. Jobs are immutable once created and are shared through [Rc], so the
//! dependency edges form a forward-only DAG.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::job::artifact::ArtifactKey;
use crate::job::task::Task;

/// Artifact identity: variable and pipeline stage
pub mod artifact;
/// Producer lookup used to wire dependencies between variables
pub mod registry;
/// Stage-specific options passed to the script body generators
pub mod task;

#[derive(Debug)]
pub struct Job {
    name: String,
    script_path: PathBuf,
    log_path: PathBuf,
    output: ArtifactKey,
    output_path: PathBuf,
    dependencies: Vec<Rc<Job>>,
    task: Task,
}

/// Everything needed to create a [Job]
pub struct JobSpec {
    pub dataset: String,
    /// Name of the variable in the output, used in the job name
    pub variable_name: String,
    pub output: ArtifactKey,
    pub output_path: PathBuf,
    pub dependencies: Vec<Rc<Job>>,
    pub task: Task,
}

impl Job {
    /// Name a job from its task, variable and dataset
    ///
    /// The same inputs always give the same name, so regenerating an unchanged configuration
    /// gives the same scripts.
    pub fn name_for(task: &Task, variable_name: &str, dataset: &str) -> String {
        format!("{}_{}_{}", task.prefix(), variable_name, dataset)
    }

    pub fn new(spec: JobSpec, script_dir: &Path, log_dir: &Path) -> Rc<Job> {
        let name = Job::name_for(&spec.task, &spec.variable_name, &spec.dataset);
        Rc::new(Job {
            script_path: script_dir.join(format!("{name}.sh")),
            log_path: log_dir.join(format!("{name}.log")),
            name,
            output: spec.output,
            output_path: spec.output_path,
            dependencies: spec.dependencies,
            task: spec.task,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn output(&self) -> &ArtifactKey {
        &self.output
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn dependencies(&self) -> &[Rc<Job>] {
        &self.dependencies
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    /// Every path the job script reads or writes
    pub fn touched_paths(&self) -> Vec<&Path> {
        let mut paths = self.task.inputs();
        paths.push(&self.output_path);
        paths.push(&self.script_path);
        paths.push(&self.log_path);
        paths
    }
}
