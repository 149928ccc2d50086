//! Drive job generation for whole datasets
//!
//! For each dataset the orchestrator builds every variable's jobs in declaration order,
//! registering each job's output as soon as it's created so later variables can depend on it.
//! It then writes every job script, orders the jobs and writes a submission script that submits
//! them with `qsub`. PBS only assigns job IDs at submission time, so the submission script
//! captures each ID in a shell variable and later `qsub` calls refer to those variables.

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use log::{debug, info};

use crate::context::GenerationContext;
use crate::dataset::DatasetDescriptor;
use crate::error::{Error, Result};
use crate::job::registry::DependencyRegistry;
use crate::job::task::Task;
use crate::job::Job;
use crate::paths::PathKind;
use crate::processor::VariableProcessor;
use crate::script::Submission;

/// Dependency ordering of a dataset's jobs
pub mod order;

pub struct ScriptOrchestrator<'a> {
    ctx: &'a GenerationContext<'a>,
}

impl<'a> ScriptOrchestrator<'a> {
    pub fn new(ctx: &'a GenerationContext<'a>) -> Self {
        ScriptOrchestrator { ctx }
    }

    /// Generate every dataset in order, then the wrapper submitting them all
    ///
    /// Returns the path of the wrapper. Datasets are independent, the wrapper just calls each
    /// submission script in turn. A wrapper left by an earlier run is removed first, so a failed
    /// run leaves nothing to submit.
    pub fn generate_all<D: DatasetDescriptor>(&self, datasets: &[D]) -> Result<PathBuf> {
        let wrapper = self.ctx.paths.wrapper_script();
        self.ctx.writers.remove(&wrapper)?;
        let mut scripts = Vec::with_capacity(datasets.len());
        for dataset in datasets {
            scripts.push(self.generate(dataset)?);
        }

        let mut writer = self.ctx.writers.create(&wrapper)?;
        self.ctx
            .submission
            .write_wrapper(&mut writer, &scripts, self.ctx.paths.base(PathKind::Output))?;
        writer.finish()?;
        info!("Wrote submission wrapper {}", wrapper.display());
        Ok(wrapper)
    }

    /// Generate every script of a dataset and return the path of its submission script
    ///
    /// Any error aborts the dataset before its submission script is written. The submission
    /// script of an earlier run is removed up front.
    pub fn generate(&self, dataset: &dyn DatasetDescriptor) -> Result<PathBuf> {
        info!("Generating scripts for dataset {}", dataset.name());
        self.ctx.writers.remove(&self.ctx.paths.submission_script(dataset.name()))?;
        self.ctx.paths.create_directories(dataset.name())?;
        let jobs = self.build_jobs(dataset)?;
        for job in &jobs {
            self.write_job_script(job)?;
        }
        let ordered = order::topological_order(&jobs)?;
        self.write_submission(dataset, &ordered)
    }

    /// Create and register the jobs of every variable required by a dataset
    pub fn build_jobs(&self, dataset: &dyn DatasetDescriptor) -> Result<Vec<Rc<Job>>> {
        let mut registry = DependencyRegistry::new();
        let mut jobs: Vec<Rc<Job>> = Vec::new();
        for variable in self.ctx.variables.required_variables(dataset) {
            let target = self.ctx.variables.target(&variable)?;
            let processor = VariableProcessor::select(target, dataset, self.ctx.options);
            debug!("Using {:?} for {} of {}", processor, variable, dataset.name());
            for job in processor.create_jobs(dataset, self.ctx, &registry)? {
                registry.register(job.output().clone(), Rc::clone(&job))?;
                jobs.push(job);
            }
        }
        info!("Created {} jobs for dataset {}", jobs.len(), dataset.name());
        Ok(jobs)
    }

    fn write_job_script(&self, job: &Job) -> Result<()> {
        let mut writer = self.ctx.writers.create(job.script_path())?;
        let storage = self.ctx.paths.storage_directives(&job.touched_paths());
        self.ctx
            .header
            .write_header(&mut writer, job.name(), job.log_path(), &storage)?;
        let generators = &self.ctx.generators;
        match job.task() {
            Task::Preprocess(options) => generators.preprocess.write_body(&mut writer, options)?,
            Task::Merge(options) => generators.merge.write_body(&mut writer, options)?,
            Task::Rechunk(options) => generators.rechunk.write_body(&mut writer, options)?,
            Task::Derive(options) => generators.derive.write_body(&mut writer, options)?,
        }
        writer.finish()?;
        info!("Wrote job script {}", job.script_path().display());
        Ok(())
    }

    fn write_submission(&self, dataset: &dyn DatasetDescriptor, ordered: &[Rc<Job>]) -> Result<PathBuf> {
        let submissions = submissions(ordered)?;
        let path = self.ctx.paths.submission_script(dataset.name());
        let mut writer = self.ctx.writers.create(&path)?;
        self.ctx
            .submission
            .write_submission(&mut writer, dataset.name(), &submissions)?;
        writer.finish()?;
        info!("Wrote submission script {}", path.display());
        Ok(path)
    }
}

/// One `qsub` per job, in the given order
///
/// Each job's ID is captured in `JOB_<n>`, `n` being its position. A job may only refer to
/// capture variables defined before it.
pub fn submissions(ordered: &[Rc<Job>]) -> Result<Vec<Submission>> {
    let mut captures: HashMap<&str, String> = HashMap::with_capacity(ordered.len());
    let mut submissions = Vec::with_capacity(ordered.len());
    for (i, job) in ordered.iter().enumerate() {
        let after = job
            .dependencies()
            .iter()
            .map(|dependency| captures.get(dependency.name()).cloned())
            .collect::<Option<Vec<String>>>()
            .ok_or_else(|| Error::UnorderedJobs(vec![job.name().to_string()]))?;
        let capture = format!("JOB_{}", i + 1);
        debug!("Emitting {} as {}", job.name(), capture);
        captures.insert(job.name(), capture.clone());
        submissions.push(Submission {
            job_name: job.name().to_string(),
            script: job.script_path().to_path_buf(),
            capture,
            after,
        });
    }
    Ok(submissions)
}
