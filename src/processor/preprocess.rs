use std::rc::Rc;

use crate::context::GenerationContext;
use crate::dataset::DatasetDescriptor;
use crate::error::Result;
use crate::job::artifact::{ArtifactKey, Stage, VariableId};
use crate::job::task::{PreprocessOptions, Task};
use crate::job::Job;
use crate::processor::create_job;
use crate::processor::merge::merge_job;

/// Unpack raw files before merging them
///
/// Produces a preprocessing job with no dependencies, then a merge job depending only on it and
/// reading the directory it writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreprocessMergeProcessor {
    variable: VariableId,
}

impl PreprocessMergeProcessor {
    pub fn new(variable: VariableId) -> Self {
        PreprocessMergeProcessor { variable }
    }

    pub fn target_variable(&self) -> &VariableId {
        &self.variable
    }

    pub fn output_format(&self) -> ArtifactKey {
        ArtifactKey::new(self.variable.clone(), Stage::Timeseries)
    }

    pub fn intermediate_outputs(&self) -> Vec<ArtifactKey> {
        vec![ArtifactKey::new(self.variable.clone(), Stage::Preprocessed)]
    }

    pub fn create_jobs(&self, dataset: &dyn DatasetDescriptor, ctx: &GenerationContext) -> Result<Vec<Rc<Job>>> {
        let target = ctx.variables.target(&self.variable)?;
        let output_path = ctx.paths.artifact_path(dataset, target, Stage::Preprocessed)?;
        let options = PreprocessOptions {
            input_dir: ctx.paths.artifact_path(dataset, target, Stage::Raw)?,
            output_dir: output_path.clone(),
            variable: dataset.input_metadata(&self.variable)?,
        };
        let preprocess = create_job(
            ctx,
            dataset,
            &target.name,
            ArtifactKey::new(self.variable.clone(), Stage::Preprocessed),
            output_path,
            Vec::new(),
            Task::Preprocess(options),
        );

        let merge_input = preprocess.output_path().to_path_buf();
        let merge = merge_job(&self.variable, merge_input, vec![Rc::clone(&preprocess)], dataset, ctx)?;
        Ok(vec![preprocess, merge])
    }
}
