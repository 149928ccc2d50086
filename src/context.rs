//! Collaborators and options shared by processors and the orchestrator
//!
//! Everything a processor needs from the outside world is reached through a
//! [GenerationContext], passed by reference. Tests swap in their own implementations of the
//! collaborator traits.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::job::task::{DeriveOptions, MergeOptions, PreprocessOptions, RechunkOptions};
use crate::paths::{FsPathManager, PathManager};
use crate::script::templates::Templates;
use crate::script::writer::WriterFactory;
use crate::script::{HeaderWriter, ScriptGenerator, SubmissionWriter};
use crate::variable::interpolation::{InterpolationSelector, UnitInterpolationSelector};
use crate::variable::{TargetVariables, VariableManager};

/// Chunk sizes of rechunked output files
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunking {
    pub time: u32,
    pub lat: u32,
    pub lon: u32,
}

/// Options computed from the configuration that shape every dataset's pipelines
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Append a rechunk job to every variable
    pub rechunk: Option<Chunking>,
    pub remap_grid: Option<PathBuf>,
    pub pack: bool,
    pub compression_level: Option<u8>,
}

/// One body generator per pipeline stage
pub struct ScriptGenerators<'a> {
    pub preprocess: &'a dyn ScriptGenerator<PreprocessOptions>,
    pub merge: &'a dyn ScriptGenerator<MergeOptions>,
    pub rechunk: &'a dyn ScriptGenerator<RechunkOptions>,
    pub derive: &'a dyn ScriptGenerator<DeriveOptions>,
}

pub struct GenerationContext<'a> {
    pub paths: &'a dyn PathManager,
    pub variables: &'a dyn VariableManager,
    pub interpolation: &'a dyn InterpolationSelector,
    pub header: &'a dyn HeaderWriter,
    pub generators: ScriptGenerators<'a>,
    pub submission: &'a dyn SubmissionWriter,
    pub writers: &'a dyn WriterFactory,
    pub options: &'a GenerationOptions,
}

/// Default collaborators built from a configuration file
pub struct Collaborators {
    paths: FsPathManager,
    variables: TargetVariables,
    interpolation: UnitInterpolationSelector,
    templates: Templates,
    options: GenerationOptions,
}

impl Collaborators {
    /// Directories are only created on disk when `create_dirs` is set
    pub fn from_config(config: &Config, create_dirs: bool) -> Result<Self> {
        Ok(Collaborators {
            paths: FsPathManager::new(config.paths.clone(), config.scheduler.storage.clone(), create_dirs),
            variables: TargetVariables::new(config.variables.clone()),
            interpolation: UnitInterpolationSelector,
            templates: Templates::new(config.scheduler.clone())?,
            options: config.processing.options(),
        })
    }

    pub fn context<'a>(&'a self, writers: &'a dyn WriterFactory) -> GenerationContext<'a> {
        GenerationContext {
            paths: &self.paths,
            variables: &self.variables,
            interpolation: &self.interpolation,
            header: &self.templates,
            generators: ScriptGenerators {
                preprocess: &self.templates,
                merge: &self.templates,
                rechunk: &self.templates,
                derive: &self.templates,
            },
            submission: &self.templates,
            writers,
            options: &self.options,
        }
    }
}
