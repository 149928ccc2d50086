#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::{json, Value};

use climjob::script::writer::MemoryWriterFactory;
use climjob::{Collaborators, Config, Result, ScriptOrchestrator};

pub const OUTPUT_DIR: &str = "/scratch/ab12/out";
pub const SCRIPT_DIR: &str = "/scratch/ab12/scripts";

/// One dataset with one variable that needs no unpacking
pub fn config_json() -> Value {
    json!({
        "paths": {
            "input_dir": "/g/data/ab12/raw",
            "output_dir": OUTPUT_DIR,
            "tmp_dir": "/scratch/ab12/tmp",
            "script_dir": SCRIPT_DIR,
            "log_dir": "/scratch/ab12/logs"
        },
        "scheduler": { "project": "ab12", "modules": ["cdo", "nco"] },
        "variables": [
            { "id": "Temperature", "name": "tas", "units": "degC" }
        ],
        "datasets": [
            {
                "name": "TestDataset",
                "variables": {
                    "Temperature": { "name": "tas", "units": "degC" }
                }
            }
        ]
    })
}

/// Two datasets, packed temperature stored as `temp` in kelvin, precipitation, a derived
/// variable and rechunking
pub fn full_config_json() -> Value {
    let mut json = config_json();
    json["processing"] = json!({ "rechunk": { "time": 365, "lat": 10, "lon": 10 }, "compression_level": 5 });
    json["variables"] = json!([
        { "id": "Temperature", "name": "tas", "units": "degC" },
        { "id": "Precipitation", "name": "pr", "units": "mm/day", "aggregation": "sum" },
        {
            "id": "PrecipitationPerDegree", "name": "prtas", "units": "mm/day/degC",
            "derive": { "inputs": ["Precipitation", "Temperature"], "expression": "pr/tas" }
        }
    ]);
    let variables = json!({
        "Temperature": { "name": "temp", "units": "K", "unpack": true },
        "Precipitation": { "name": "pr", "units": "kg m-2 s-1" }
    });
    json["datasets"] = json!([
        { "name": "TestDataset", "timestep_hours": 3, "variables": variables.clone() },
        { "name": "Other", "variables": variables }
    ]);
    json
}

pub fn config(json: Value) -> Config {
    Config::from_json_str(&json.to_string()).expect("valid configuration")
}

/// Generate every dataset of a configuration into memory
pub fn generate(config: &Config) -> (MemoryWriterFactory, Result<PathBuf>) {
    let collaborators = Collaborators::from_config(config, false).expect("collaborators");
    let writers = MemoryWriterFactory::new();
    let result = {
        let ctx = collaborators.context(&writers);
        let datasets = config.datasets(&[]).expect("datasets");
        ScriptOrchestrator::new(&ctx).generate_all(&datasets)
    };
    (writers, result)
}

/// Job names submitted by a submission script, in submission order
pub fn submitted_jobs(submission: &str) -> Vec<String> {
    submission
        .lines()
        .filter_map(|line| line.strip_prefix("echo \""))
        .filter_map(|rest| rest.split(':').next())
        .map(str::to_string)
        .collect()
}
