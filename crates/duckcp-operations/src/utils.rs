use duckcp_core::{DuckcpError, DuckcpResult};
use duckcp_utils::path::resolve_path;
use serde_json::Value as JsonValue;

use crate::types::Properties;

pub fn require<'a>(value: &'a str, name: &str) -> DuckcpResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DuckcpError::Validation(format!("missing {name}")));
    }
    Ok(value)
}

pub fn absolute_path(path: &str) -> DuckcpResult<String> {
    Ok(resolve_path(path)?.to_string_lossy().into_owned())
}

/// Rewrites the given path-valued properties to absolute paths.
pub fn absolutize(properties: &mut Properties, keys: &[&str]) -> DuckcpResult<()> {
    for key in keys {
        if let Some(JsonValue::String(path)) = properties.get(*key) {
            if !path.is_empty() {
                let resolved = absolute_path(path)?;
                properties.insert((*key).to_string(), JsonValue::String(resolved));
            }
        }
    }
    Ok(())
}

pub fn not_found(what: &str, code: &str) -> DuckcpError {
    DuckcpError::NotFound(format!("{what} ({code}) does not exist"))
}

pub fn already_exists(what: &str, code: &str) -> DuckcpError {
    DuckcpError::Validation(format!("{what} ({code}) already exists"))
}
