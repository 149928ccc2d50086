use std::rc::Rc;

use crate::context::{Chunking, GenerationContext};
use crate::dataset::DatasetDescriptor;
use crate::error::{Error, Result};
use crate::job::artifact::{ArtifactKey, Stage, VariableId};
use crate::job::registry::DependencyRegistry;
use crate::job::task::{RechunkOptions, Task};
use crate::job::Job;
use crate::processor::{create_job, VariableProcessor};

/// Run another pipeline, then rechunk its final output
#[derive(Clone, Debug, PartialEq)]
pub struct RechunkProcessor {
    base: Box<VariableProcessor>,
    chunking: Chunking,
}

impl RechunkProcessor {
    pub fn new(base: VariableProcessor, chunking: Chunking) -> Self {
        RechunkProcessor { base: Box::new(base), chunking }
    }

    pub fn target_variable(&self) -> &VariableId {
        self.base.target_variable()
    }

    pub fn output_format(&self) -> ArtifactKey {
        ArtifactKey::new(self.target_variable().clone(), Stage::Rechunked)
    }

    pub fn intermediate_outputs(&self) -> Vec<ArtifactKey> {
        let mut outputs = self.base.intermediate_outputs();
        outputs.push(self.base.output_format());
        outputs
    }

    pub fn dependencies(&self) -> Vec<ArtifactKey> {
        self.base.dependencies()
    }

    pub fn create_jobs(
        &self,
        dataset: &dyn DatasetDescriptor,
        ctx: &GenerationContext,
        registry: &DependencyRegistry,
    ) -> Result<Vec<Rc<Job>>> {
        let mut jobs = self.base.create_jobs(dataset, ctx, registry)?;
        let merged = jobs
            .last()
            .cloned()
            .ok_or_else(|| Error::MissingProducer(self.base.output_format()))?;

        // the base pipeline has already renamed the variable, only the output name exists now
        let target = ctx.variables.target(self.target_variable())?;
        let output_path = ctx.paths.artifact_path(dataset, target, Stage::Rechunked)?;
        let options = RechunkOptions {
            input_file: merged.output_path().to_path_buf(),
            output_file: output_path.clone(),
            variable: target.name.clone(),
            chunking: self.chunking,
            compression_level: ctx.options.compression_level,
        };
        let rechunk = create_job(
            ctx,
            dataset,
            &target.name,
            self.output_format(),
            output_path,
            vec![merged],
            Task::Rechunk(options),
        );
        jobs.push(rechunk);
        Ok(jobs)
    }
}
