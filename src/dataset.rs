//! Climate datasets described by the configuration

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::job::artifact::VariableId;
use crate::variable::VariableMeta;

/// Per-dataset facts needed to build jobs
pub trait DatasetDescriptor {
    fn name(&self) -> &str;

    /// Hours between consecutive time steps of the raw data
    fn timestep_hours(&self) -> u32;

    /// Directory holding the raw files of a variable
    fn input_dir(&self, variable: &VariableId) -> Result<PathBuf>;

    /// Name and units of a variable in the raw files
    fn input_metadata(&self, variable: &VariableId) -> Result<VariableMeta>;

    /// Raw files are packed and must be unpacked before merging
    fn requires_unpack(&self, variable: &VariableId) -> bool;
}

/// How a dataset stores one variable
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetVariable {
    pub name: String,
    pub units: String,
    /// Overrides `<dataset input_dir>/<name>`
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub unpack: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub input_dir: PathBuf,
    pub timestep_hours: u32,
    pub variables: BTreeMap<VariableId, DatasetVariable>,
}

impl Dataset {
    fn variable(&self, variable: &VariableId) -> Result<&DatasetVariable> {
        self.variables.get(variable).ok_or_else(|| {
            Error::Config(format!("dataset {} has no variable {}", self.name, variable))
        })
    }
}

impl DatasetDescriptor for Dataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn timestep_hours(&self) -> u32 {
        self.timestep_hours
    }

    fn input_dir(&self, variable: &VariableId) -> Result<PathBuf> {
        let var = self.variable(variable)?;
        Ok(var.path.clone().unwrap_or_else(|| self.input_dir.join(&var.name)))
    }

    fn input_metadata(&self, variable: &VariableId) -> Result<VariableMeta> {
        let var = self.variable(variable)?;
        Ok(VariableMeta::new(&var.name, &var.units))
    }

    fn requires_unpack(&self, variable: &VariableId) -> bool {
        self.variables.get(variable).map(|v| v.unpack).unwrap_or(false)
    }
}
