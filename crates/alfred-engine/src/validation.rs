use crate::{Error, Result};
use serde_json::Value;
use std::collections::BTreeSet;

/// Upper-case every `operation` field in the artifact, recursively.
///
/// Submitters disagree on the casing of file operations ("create" vs
/// "CREATE"); the schemas accept only the canonical upper-case form, so
/// normalization runs before validation. No other field is touched.
pub fn normalize_artifact(artifact: &mut Value) {
    match artifact {
        Value::Object(map) => {
            if let Some(Value::String(op)) = map.get_mut("operation") {
                *op = op.to_uppercase();
            }
            for value in map.values_mut() {
                normalize_artifact(value);
            }
        }
        Value::Array(items) => {
            for item in items {
                normalize_artifact(item);
            }
        }
        _ => {}
    }
}

/// Validate an artifact against a JSON Schema document.
///
/// All diagnostics are collected so the calling agent can self-correct
/// in one pass instead of resubmitting once per error.
pub fn validate_artifact(schema: &Value, artifact: &Value) -> Result<()> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| Error::Definition(format!("invalid artifact schema: {e}")))?;

    let diagnostics: Vec<String> = validator
        .iter_errors(artifact)
        .map(|err| format!("{} (at instance path '{}')", err, err.instance_path()))
        .collect();

    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(diagnostics))
    }
}

/// Cross-check an implementation manifest against the recorded plan.
///
/// Every `subtask_id` the plan declares must appear in the manifest's
/// `completed_subtasks`; extras are silently accepted. The error names
/// the missing set and the completion percentage so partial work is
/// visible at a glance.
pub fn check_subtask_completion(plan: &Value, manifest: &Value) -> Result<()> {
    let planned: Vec<&str> = plan
        .get("subtasks")
        .and_then(Value::as_array)
        .map(|subtasks| {
            subtasks
                .iter()
                .filter_map(|s| s.get("subtask_id").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if planned.is_empty() {
        return Ok(());
    }

    let completed: BTreeSet<&str> = manifest
        .get("completed_subtasks")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let missing: Vec<&str> = planned
        .iter()
        .copied()
        .filter(|id| !completed.contains(id))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let done = planned.len() - missing.len();
    let percent = (done as f64 / planned.len() as f64 * 100.0).round() as u32;
    Err(Error::Validation(vec![format!(
        "implementation is {}% complete ({}/{} subtasks); missing: {}",
        percent,
        done,
        planned.len(),
        missing.join(", ")
    )]))
}
