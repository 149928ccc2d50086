use jsonschema::JSONSchema;
use log::{info, warn};
use serde_json::Value;

use crate::error::{Error, Result};

/// included configuration schema (draft 7)
static SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/config.json"));

pub fn validate(json: &Value) -> Result<()> {
    info!("Validating configuration against JSON schema");
    let schema = compile_schema()?;
    // errors borrow the compiled schema, so collect them before it's dropped
    let outcome = match schema.validate(json) {
        Ok(()) => Ok(()),
        Err(errors) => {
            let messages: Vec<String> = errors
                .map(|err| format!("{} (at '{}')", err, err.instance_path))
                .collect();
            warn!("Configuration fails validation");
            Err(Error::Config(messages.join("; ")))
        }
    };
    outcome
}

fn compile_schema() -> Result<JSONSchema> {
    let schema_json: Value = serde_json::from_str(SCHEMA)
        .map_err(|err| Error::Config(format!("embedded schema is not JSON: {err}")))?;
    JSONSchema::compile(&schema_json)
        .map_err(|err| Error::Config(format!("embedded schema doesn't compile: {err}")))
}
