use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical identifier of a variable, e.g. `Temperature`
///
/// This is the name used in the configuration, not the name of the variable inside the netCDF
/// files (see [crate::variable::VariableMeta]).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(String);

impl VariableId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VariableId {
    fn from(id: &str) -> Self {
        VariableId(id.to_string())
    }
}

impl From<String> for VariableId {
    fn from(id: String) -> Self {
        VariableId(id)
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stage of an artifact
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Raw,
    Preprocessed,
    Timeseries,
    Rechunked,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::Raw => write!(f, "raw"),
            Stage::Preprocessed => write!(f, "preprocessed"),
            Stage::Timeseries => write!(f, "timeseries"),
            Stage::Rechunked => write!(f, "rechunked"),
        }
    }
}

/// A data product identified by variable and stage
///
/// Used as the registry key and as the declared output of a job.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactKey {
    pub variable: VariableId,
    pub stage: Stage,
}

impl ArtifactKey {
    pub fn new(variable: VariableId, stage: Stage) -> Self {
        ArtifactKey { variable, stage }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.variable, self.stage)
    }
}
