use std::rc::Rc;

use crate::context::GenerationContext;
use crate::dataset::DatasetDescriptor;
use crate::error::Result;
use crate::job::artifact::{ArtifactKey, Stage, VariableId};
use crate::job::registry::DependencyRegistry;
use crate::job::task::{DeriveOptions, Task};
use crate::job::Job;
use crate::processor::create_job;
use crate::variable::Derivation;

/// Compute a variable from the time series of variables generated earlier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeriveProcessor {
    variable: VariableId,
    inputs: Vec<VariableId>,
    expression: String,
}

impl DeriveProcessor {
    pub fn new(variable: VariableId, derivation: &Derivation) -> Self {
        DeriveProcessor {
            variable,
            inputs: derivation.inputs.clone(),
            expression: derivation.expression.clone(),
        }
    }

    pub fn target_variable(&self) -> &VariableId {
        &self.variable
    }

    pub fn output_format(&self) -> ArtifactKey {
        ArtifactKey::new(self.variable.clone(), Stage::Timeseries)
    }

    pub fn dependencies(&self) -> Vec<ArtifactKey> {
        self.inputs
            .iter()
            .map(|input| ArtifactKey::new(input.clone(), Stage::Timeseries))
            .collect()
    }

    pub fn create_jobs(
        &self,
        dataset: &dyn DatasetDescriptor,
        ctx: &GenerationContext,
        registry: &DependencyRegistry,
    ) -> Result<Vec<Rc<Job>>> {
        let producers = self
            .dependencies()
            .iter()
            .map(|key| registry.lookup(key))
            .collect::<Result<Vec<Rc<Job>>>>()?;

        let target = ctx.variables.target(&self.variable)?;
        let output_path = ctx.paths.artifact_path(dataset, target, Stage::Timeseries)?;
        let options = DeriveOptions {
            input_files: producers.iter().map(|job| job.output_path().to_path_buf()).collect(),
            output_file: output_path.clone(),
            output: target.meta(),
            expression: self.expression.clone(),
            compression_level: ctx.options.compression_level,
        };
        let derive = create_job(
            ctx,
            dataset,
            &target.name,
            self.output_format(),
            output_path,
            producers,
            Task::Derive(options),
        );
        Ok(vec![derive])
    }
}
