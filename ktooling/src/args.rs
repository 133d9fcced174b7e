//! Argument validation helpers for function-call arguments.
//!
//! ```rust
//! use ktooling::required_string;
//! use serde_json::json;
//!
//! let args = json!({"location": "Sapporo"}).as_object().cloned().expect("object");
//! let location = required_string(&args, "location").expect("location should be present");
//! assert_eq!(location, "Sapporo");
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

/// A missing, non-string, or blank argument is a hard error: the model sent
/// a malformed call.
pub fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    let value = args
        .get(key)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required argument '{key}'")))?;

    let text = value.as_str().ok_or_else(|| {
        ToolError::invalid_arguments(format!("argument '{key}' must be a string"))
    })?;

    if text.trim().is_empty() {
        return Err(ToolError::invalid_arguments(format!(
            "argument '{key}' must not be empty"
        )));
    }

    Ok(text.to_string())
}

/// Builds a JSON schema object with one required string property per entry.
pub fn string_parameters(properties: &[(&str, &str)]) -> Value {
    let mut schema_properties = Map::new();
    for (name, description) in properties {
        schema_properties.insert(
            (*name).to_string(),
            serde_json::json!({"type": "string", "description": description}),
        );
    }

    let required = properties
        .iter()
        .map(|(name, _)| Value::String((*name).to_string()))
        .collect::<Vec<_>>();

    serde_json::json!({
        "type": "object",
        "properties": schema_properties,
        "required": required,
    })
}
