//! Environment spec loading.
//!
//! The spec file declares one partial `base_environment` that is deep-merged
//! into every entry of `environments` before the result is validated. Loading
//! is all-or-nothing: any invalid environment fails the whole spec.
use crate::error::HealthError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Container environment after merging with the base environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    #[serde(rename = "base-image")]
    pub base_image: String,
    #[serde(default)]
    pub apt: Vec<String>,
    #[serde(default)]
    pub pip: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_startup: Option<String>,
}

/// Producer validated against a list of environments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub environments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    #[serde(default)]
    pub environments: Vec<Environment>,
    pub producers: Vec<Producer>,
}

/// Load a spec file, merging the base environment into every environment.
pub fn load_spec(path: &Path) -> Result<Spec> {
    if !path.is_file() {
        return Err(HealthError::SpecNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let spec = parse_spec(&text).map_err(|message| HealthError::Schema {
        path: path.to_path_buf(),
        message,
    })?;
    tracing::debug!(
        path = %path.display(),
        environments = ?spec.environments,
        "loaded environment spec"
    );
    Ok(spec)
}

fn parse_spec(text: &str) -> Result<Spec, String> {
    let mut data: Value = serde_yaml::from_str(text).map_err(|err| err.to_string())?;
    let root = data
        .as_mapping_mut()
        .ok_or_else(|| "top level must be a mapping".to_string())?;
    let base = root
        .remove("base_environment")
        .ok_or_else(|| "missing base_environment".to_string())?;
    if !base.is_mapping() {
        return Err("base_environment must be a mapping".to_string());
    }
    let overrides = match root.remove("environments") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(entries)) => entries,
        Some(_) => return Err("environments must be a list".to_string()),
    };
    let merged = overrides
        .into_iter()
        .map(|entry| deep_merge(base.clone(), entry))
        .collect();
    root.insert(Value::from("environments"), Value::Sequence(merged));

    let spec: Spec = serde_yaml::from_value(data).map_err(|err| err.to_string())?;
    validate_names(&spec)?;
    Ok(spec)
}

fn validate_names(spec: &Spec) -> Result<(), String> {
    let mut seen = HashSet::new();
    for env in &spec.environments {
        if env.name.is_empty() || env.name.contains(['/', '\\']) {
            return Err(format!("invalid environment name {:?}", env.name));
        }
        if !seen.insert(env.name.as_str()) {
            return Err(format!("duplicate environment name {:?}", env.name));
        }
    }
    Ok(())
}

/// Merge `overlay` onto `base`.
///
/// Mappings merge key by key, sequences concatenate base-first without
/// deduplication, and anything else (scalars, mismatched kinds) takes the
/// overlay value.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => Value::Mapping(merge_mappings(base, overlay)),
        (Value::Sequence(mut base), Value::Sequence(overlay)) => {
            base.extend(overlay);
            Value::Sequence(base)
        }
        (_, overlay) => overlay,
    }
}

fn merge_mappings(mut base: Mapping, overlay: Mapping) -> Mapping {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => {
                let current = std::mem::take(existing);
                *existing = deep_merge(current, value);
            }
            None => {
                base.insert(key, value);
            }
        }
    }
    base
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
