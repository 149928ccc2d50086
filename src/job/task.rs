use std::path::{Path, PathBuf};

use crate::context::Chunking;
use crate::variable::interpolation::Interpolation;
use crate::variable::{Aggregation, VariableMeta};

/// Unpack raw files of one variable into a staging directory
#[derive(Clone, Debug, PartialEq)]
pub struct PreprocessOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub variable: VariableMeta,
}

/// Concatenate raw files along time, renaming and converting to the target variable
#[derive(Clone, Debug, PartialEq)]
pub struct MergeOptions {
    pub input_dir: PathBuf,
    pub output_file: PathBuf,
    /// Variable as it is stored in the input files
    pub input: VariableMeta,
    /// Variable as it must appear in the output file
    pub output: VariableMeta,
    /// CDO operators converting input units to output units
    pub conversion: Vec<String>,
    pub timestep_hours: u32,
    pub aggregation: Aggregation,
    pub remap_grid: Option<PathBuf>,
    pub interpolation: Interpolation,
    pub pack: bool,
    pub compression_level: Option<u8>,
}

/// Rewrite a merged file with a chunk layout suited to reading long time series
#[derive(Clone, Debug, PartialEq)]
pub struct RechunkOptions {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    /// Output variable name, the merge stage has already applied any rename
    pub variable: String,
    pub chunking: Chunking,
    pub compression_level: Option<u8>,
}

/// Compute a variable from the time series of other variables
#[derive(Clone, Debug, PartialEq)]
pub struct DeriveOptions {
    pub input_files: Vec<PathBuf>,
    pub output_file: PathBuf,
    pub output: VariableMeta,
    pub expression: String,
    pub compression_level: Option<u8>,
}

/// What a job script does, one variant per script body generator
#[derive(Clone, Debug, PartialEq)]
pub enum Task {
    Preprocess(PreprocessOptions),
    Merge(MergeOptions),
    Rechunk(RechunkOptions),
    Derive(DeriveOptions),
}

impl Task {
    /// Prefix of the names of jobs running this task
    pub fn prefix(&self) -> &'static str {
        match self {
            Task::Preprocess(_) => "preprocessing",
            Task::Merge(_) => "mergetime",
            Task::Rechunk(_) => "rechunk",
            Task::Derive(_) => "derive",
        }
    }

    /// Paths read by the task
    pub fn inputs(&self) -> Vec<&Path> {
        match self {
            Task::Preprocess(opts) => vec![opts.input_dir.as_path()],
            Task::Merge(opts) => {
                let mut inputs = vec![opts.input_dir.as_path()];
                inputs.extend(opts.remap_grid.as_deref());
                inputs
            }
            Task::Rechunk(opts) => vec![opts.input_file.as_path()],
            Task::Derive(opts) => opts.input_files.iter().map(PathBuf::as_path).collect(),
        }
    }
}
