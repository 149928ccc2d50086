//! Load and validate the generator configuration
//!
//! Configuration is a JSON document. It's checked against an embedded JSON schema first, then
//! deserialised and checked for constraints the schema can't express (unique names, derived
//! variables declared after their inputs, every dataset providing every raw variable).

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{Chunking, GenerationOptions};
use crate::dataset::{Dataset, DatasetVariable};
use crate::error::{Error, Result};
use crate::job::artifact::VariableId;
use crate::paths::PathsConfig;
use crate::queue::Queue;
use crate::variable::TargetVariable;

/// Validate raw configuration against the embedded JSON schema
pub mod schema;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// Target variables in generation order
    pub variables: Vec<TargetVariable>,
    pub datasets: Vec<DatasetConfig>,
}

/// PBS resources requested by every job
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub project: String,
    #[serde(default)]
    pub queue: Queue,
    #[serde(default = "default_walltime")]
    pub walltime: String,
    #[serde(default = "default_ncpus")]
    pub ncpus: u32,
    #[serde(default = "default_memory")]
    pub memory: String,
    #[serde(default)]
    pub jobfs: Option<String>,
    /// Storage directives added to those derived from job paths
    #[serde(default)]
    pub storage: Vec<String>,
    /// Address notified when a job aborts
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub modules: Vec<String>,
}

fn default_walltime() -> String {
    "04:00:00".to_string()
}

fn default_ncpus() -> u32 {
    1
}

fn default_memory() -> String {
    "8GB".to_string()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default)]
    pub rechunk: Option<Chunking>,
    #[serde(default)]
    pub remap_grid: Option<PathBuf>,
    #[serde(default)]
    pub pack: bool,
    #[serde(default)]
    pub compression_level: Option<u8>,
}

impl ProcessingConfig {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            rechunk: self.rechunk,
            remap_grid: self.remap_grid.clone(),
            pack: self.pack,
            compression_level: self.compression_level,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    /// Defaults to `<paths.input_dir>/<name>`
    #[serde(default)]
    pub input_dir: Option<PathBuf>,
    #[serde(default = "default_timestep")]
    pub timestep_hours: u32,
    pub variables: BTreeMap<VariableId, DatasetVariable>,
}

fn default_timestep() -> u32 {
    24
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        info!("Reading configuration at {}", path.display());
        let json_string = fs::read_to_string(path).map_err(|err| {
            warn!("Can't read configuration at path {}: {}", path.display(), err);
            Error::Config(format!("can't read {}: {}", path.display(), err))
        })?;
        Config::from_json_str(&json_string)
    }

    pub fn from_json_str(json_string: &str) -> Result<Config> {
        info!("Parsing JSON into untyped structure");
        let json: Value = serde_json::from_str(json_string)
            .map_err(|err| Error::Config(format!("invalid JSON: {err}")))?;
        schema::validate(&json)?;
        info!("Deserialising valid JSON into typed configuration");
        let config: Config = serde_json::from_value(json)
            .map_err(|err| Error::Config(format!("can't deserialise configuration: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(level) = self.processing.compression_level {
            if !(1..=9).contains(&level) {
                return Err(Error::Config(format!("compression level {level} is outside 1-9")));
            }
        }

        let mut declared: HashSet<&VariableId> = HashSet::new();
        let mut names: HashSet<&str> = HashSet::new();
        for variable in &self.variables {
            if let Some(derivation) = &variable.derive {
                if derivation.inputs.is_empty() {
                    return Err(Error::Config(format!("derived variable {} has no inputs", variable.id)));
                }
                if let Some(input) = derivation.inputs.iter().find(|i| !declared.contains(i)) {
                    return Err(Error::Config(format!(
                        "derived variable {} uses {}, which must be declared before it",
                        variable.id, input
                    )));
                }
            }
            if !declared.insert(&variable.id) {
                return Err(Error::Config(format!("variable {} is declared twice", variable.id)));
            }
            if !names.insert(&variable.name) {
                return Err(Error::Config(format!("output name {} is used twice", variable.name)));
            }
        }

        let mut datasets: HashSet<&str> = HashSet::new();
        for dataset in &self.datasets {
            if !is_path_component(&dataset.name) {
                return Err(Error::Config(format!("dataset name '{}' can't be used in paths", dataset.name)));
            }
            if !datasets.insert(&dataset.name) {
                return Err(Error::Config(format!("dataset {} is declared twice", dataset.name)));
            }
            let missing = self
                .variables
                .iter()
                .filter(|v| v.derive.is_none())
                .find(|v| !dataset.variables.contains_key(&v.id));
            if let Some(variable) = missing {
                return Err(Error::Config(format!("dataset {} doesn't provide {}", dataset.name, variable.id)));
            }
        }
        Ok(())
    }

    /// Datasets to generate, all of them when `names` is empty
    ///
    /// Configuration order is kept whatever the order of `names`.
    pub fn datasets(&self, names: &[String]) -> Result<Vec<Dataset>> {
        if let Some(unknown) = names.iter().find(|n| !self.datasets.iter().any(|d| &d.name == *n)) {
            return Err(Error::Config(format!("unknown dataset {unknown}")));
        }
        Ok(self
            .datasets
            .iter()
            .filter(|d| names.is_empty() || names.contains(&d.name))
            .map(|d| Dataset {
                name: d.name.clone(),
                input_dir: d.input_dir.clone().unwrap_or_else(|| self.paths.input_dir.join(&d.name)),
                timestep_hours: d.timestep_hours,
                variables: d.variables.clone(),
            })
            .collect())
    }
}

fn is_path_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_json() -> Value {
        json!({
            "paths": {
                "input_dir": "/g/data/ab12/raw",
                "output_dir": "/scratch/ab12/out",
                "tmp_dir": "/scratch/ab12/tmp",
                "script_dir": "/home/user/scripts",
                "log_dir": "/home/user/logs"
            },
            "scheduler": { "project": "ab12" },
            "variables": [
                { "id": "Temperature", "name": "tas", "units": "degC" },
                { "id": "Precipitation", "name": "pr", "units": "mm/day", "aggregation": "sum" }
            ],
            "datasets": [
                {
                    "name": "TestDataset",
                    "variables": {
                        "Temperature": { "name": "temp", "units": "K" },
                        "Precipitation": { "name": "pr", "units": "kg m-2 s-1", "unpack": true }
                    }
                }
            ]
        })
    }

    fn parse(json: Value) -> Result<Config> {
        Config::from_json_str(&json.to_string())
    }

    #[test]
    fn defaults_are_filled_in() {
        let config = parse(config_json()).unwrap();
        assert_eq!(config.scheduler.queue, Queue::Normal);
        assert_eq!(config.scheduler.walltime, "04:00:00");
        assert_eq!(config.processing.options(), GenerationOptions::default());
        let datasets = config.datasets(&[]).unwrap();
        assert_eq!(datasets[0].input_dir, PathBuf::from("/g/data/ab12/raw/TestDataset"));
        assert_eq!(datasets[0].timestep_hours, 24);
    }

    #[test]
    fn schema_rejects_missing_project() {
        let mut json = config_json();
        json["scheduler"] = json!({});
        assert!(matches!(parse(json), Err(Error::Config(_))));
    }

    #[test]
    fn derived_variable_must_follow_its_inputs() {
        let mut json = config_json();
        json["variables"].as_array_mut().unwrap().insert(0, json!({
            "id": "Range", "name": "dtr", "units": "degC",
            "derive": { "inputs": ["Temperature"], "expression": "tas" }
        }));
        let err = parse(json).unwrap_err();
        assert!(err.to_string().contains("must be declared before it"));
    }

    #[test]
    fn derived_variable_needs_inputs() {
        let mut json = config_json();
        json["variables"].as_array_mut().unwrap().push(json!({
            "id": "Constant", "name": "one", "units": "1",
            "derive": { "inputs": [], "expression": "1" }
        }));
        let err = parse(json).unwrap_err();
        assert!(err.to_string().contains("derived variable Constant has no inputs"));
    }

    #[test]
    fn variable_ids_are_unique() {
        let mut json = config_json();
        json["variables"].as_array_mut().unwrap().push(json!({
            "id": "Temperature", "name": "t2m", "units": "K"
        }));
        let err = parse(json).unwrap_err();
        assert!(err.to_string().contains("variable Temperature is declared twice"));
    }

    #[test]
    fn output_names_are_unique() {
        let mut json = config_json();
        json["variables"].as_array_mut().unwrap().push(json!({
            "id": "MaxTemperature", "name": "tas", "units": "degC", "aggregation": "max"
        }));
        let err = parse(json).unwrap_err();
        assert!(err.to_string().contains("output name tas is used twice"));
    }

    #[test]
    fn dataset_names_are_unique() {
        let mut json = config_json();
        let duplicate = json["datasets"][0].clone();
        json["datasets"].as_array_mut().unwrap().push(duplicate);
        let err = parse(json).unwrap_err();
        assert!(err.to_string().contains("dataset TestDataset is declared twice"));
    }

    #[test]
    fn chunk_sizes_must_be_positive() {
        let mut json = config_json();
        json["processing"] = json!({ "rechunk": { "time": 0, "lat": 10, "lon": 10 } });
        let err = parse(json).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("rechunk"));
    }

    #[test]
    fn dataset_must_provide_raw_variables() {
        let mut json = config_json();
        json["datasets"][0]["variables"].as_object_mut().unwrap().remove("Precipitation");
        let err = parse(json).unwrap_err();
        assert!(err.to_string().contains("doesn't provide Precipitation"));
    }

    #[test]
    fn dataset_names_must_be_path_safe() {
        let mut json = config_json();
        json["datasets"][0]["name"] = json!("bad/name");
        assert!(matches!(parse(json), Err(Error::Config(_))));
    }

    #[test]
    fn compression_level_is_bounded() {
        let mut json = config_json();
        json["processing"] = json!({ "compression_level": 12 });
        assert!(matches!(parse(json), Err(Error::Config(_))));
    }

    #[test]
    fn dataset_filter_keeps_configuration_order() {
        let mut json = config_json();
        let mut second = json["datasets"][0].clone();
        second["name"] = json!("Other");
        json["datasets"].as_array_mut().unwrap().push(second);
        let config = parse(json).unwrap();
        let names: Vec<String> = config
            .datasets(&["Other".to_string(), "TestDataset".to_string()])
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["TestDataset", "Other"]);
        assert!(config.datasets(&["Missing".to_string()]).is_err());
    }

    #[test]
    fn demo_configuration_loads() {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/gadi.json"));
        let config = Config::load(path).unwrap();
        assert_eq!(config.scheduler.jobfs.as_deref(), Some("100GB"));
        assert_eq!(config.datasets(&[]).unwrap().len(), 2);
    }
}
