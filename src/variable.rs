//! Target variables and their metadata

use serde::{Deserialize, Serialize};

use crate::dataset::DatasetDescriptor;
use crate::error::{Error, Result};
use crate::job::artifact::VariableId;

/// Pick a regridding algorithm for a variable
pub mod interpolation;
/// Unit conversions applied while merging
pub mod units;

/// Name and units of a variable as stored in a netCDF file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMeta {
    pub name: String,
    pub units: String,
}

impl VariableMeta {
    pub fn new(name: &str, units: &str) -> Self {
        VariableMeta { name: name.to_string(), units: units.to_string() }
    }
}

/// How sub-daily data is reduced to daily values
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Mean,
    Sum,
    Min,
    Max,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Mean => "mean",
            Aggregation::Sum => "sum",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
        }
    }
}

/// A variable computed from the time series of other variables
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivation {
    pub inputs: Vec<VariableId>,
    /// Right hand side of the expression, written in terms of the inputs' output names
    pub expression: String,
}

/// A variable the generated pipelines must produce
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetVariable {
    pub id: VariableId,
    /// Variable name in the output files
    pub name: String,
    pub units: String,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub derive: Option<Derivation>,
}

impl TargetVariable {
    pub fn meta(&self) -> VariableMeta {
        VariableMeta::new(&self.name, &self.units)
    }
}

/// Source of the variables to generate for a dataset
pub trait VariableManager {
    /// Variables required for a dataset, in generation order
    fn required_variables(&self, dataset: &dyn DatasetDescriptor) -> Vec<VariableId>;

    fn target(&self, variable: &VariableId) -> Result<&TargetVariable>;
}

/// Target variables in declaration order
#[derive(Clone, Debug, Default)]
pub struct TargetVariables {
    variables: Vec<TargetVariable>,
}

impl TargetVariables {
    pub fn new(variables: Vec<TargetVariable>) -> Self {
        TargetVariables { variables }
    }
}

impl VariableManager for TargetVariables {
    /// Every dataset produces every target variable
    fn required_variables(&self, _dataset: &dyn DatasetDescriptor) -> Vec<VariableId> {
        self.variables.iter().map(|v| v.id.clone()).collect()
    }

    fn target(&self, variable: &VariableId) -> Result<&TargetVariable> {
        self.variables
            .iter()
            .find(|v| &v.id == variable)
            .ok_or_else(|| Error::Config(format!("{variable} is not a target variable")))
    }
}
