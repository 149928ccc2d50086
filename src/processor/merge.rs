use std::path::PathBuf;
use std::rc::Rc;

use crate::context::GenerationContext;
use crate::dataset::DatasetDescriptor;
use crate::error::Result;
use crate::job::artifact::{ArtifactKey, Stage, VariableId};
use crate::job::task::{MergeOptions, Task};
use crate::job::Job;
use crate::processor::create_job;
use crate::variable::units;

/// Merge the raw files of a variable into one time series
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeProcessor {
    variable: VariableId,
}

impl MergeProcessor {
    pub fn new(variable: VariableId) -> Self {
        MergeProcessor { variable }
    }

    pub fn target_variable(&self) -> &VariableId {
        &self.variable
    }

    pub fn output_format(&self) -> ArtifactKey {
        ArtifactKey::new(self.variable.clone(), Stage::Timeseries)
    }

    pub fn create_jobs(&self, dataset: &dyn DatasetDescriptor, ctx: &GenerationContext) -> Result<Vec<Rc<Job>>> {
        let target = ctx.variables.target(&self.variable)?;
        let input_dir = ctx.paths.artifact_path(dataset, target, Stage::Raw)?;
        let merge = merge_job(&self.variable, input_dir, Vec::new(), dataset, ctx)?;
        Ok(vec![merge])
    }
}

/// Build the merge job of a variable reading `input_dir`
///
/// The merge job renames the variable to its output name and converts it to the output units,
/// so later stages only ever see the output name.
pub(crate) fn merge_job(
    variable: &VariableId,
    input_dir: PathBuf,
    dependencies: Vec<Rc<Job>>,
    dataset: &dyn DatasetDescriptor,
    ctx: &GenerationContext,
) -> Result<Rc<Job>> {
    let target = ctx.variables.target(variable)?;
    let input = dataset.input_metadata(variable)?;
    let output = target.meta();
    let output_path = ctx.paths.artifact_path(dataset, target, Stage::Timeseries)?;

    let options = MergeOptions {
        input_dir,
        output_file: output_path.clone(),
        conversion: units::conversion(&input.units, &output.units)?,
        interpolation: ctx.interpolation.select(&output, variable),
        input,
        output,
        timestep_hours: dataset.timestep_hours(),
        aggregation: target.aggregation,
        remap_grid: ctx.options.remap_grid.clone(),
        pack: ctx.options.pack,
        compression_level: ctx.options.compression_level,
    };
    Ok(create_job(
        ctx,
        dataset,
        &target.name,
        ArtifactKey::new(variable.clone(), Stage::Timeseries),
        output_path,
        dependencies,
        Task::Merge(options),
    ))
}
