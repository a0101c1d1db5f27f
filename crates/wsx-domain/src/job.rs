use serde_json::{Map, Value};

use crate::path::WorkspacePath;

pub type RunParameters = Map<String, Value>;

/// Flattens parameter values into strings, the only shape the runs API accepts.
///
/// Strings pass through untouched; anything else becomes its compact JSON text.
pub fn coerce_parameters(parameters: RunParameters) -> Map<String, Value> {
    parameters
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(text) => Value::String(text),
                other => Value::String(other.to_string()),
            };
            (name, value)
        })
        .collect()
}

pub fn default_run_name(prefix: &str, path: &WorkspacePath) -> String {
    format!("{prefix}{}", path.name())
}
