//! Step validation: the only place raw model output becomes a [`ValidatedStep`].
//!
//! Checks, in order: the file exists in the snapshot (verbatim path),
//! title and description are non-empty, `line` is a positive integer (else
//! dropped from the step, the step itself is kept). `selection` passes
//! through as-is. Invalid steps are dropped, never reported as errors.

use crate::models::{RawStep, RepositorySnapshot, ValidatedStep};

/// Filter `raw` down to valid steps, preserving order.
pub fn validate(raw: &[RawStep], snapshot: &RepositorySnapshot) -> Vec<ValidatedStep> {
    let validated: Vec<ValidatedStep> = raw
        .iter()
        .filter_map(|step| validate_step(step, snapshot))
        .collect();

    tracing::info!(
        validated = validated.len(),
        generated = raw.len(),
        "validated steps"
    );
    validated
}

fn validate_step(step: &RawStep, snapshot: &RepositorySnapshot) -> Option<ValidatedStep> {
    let file = match step.file.as_deref() {
        Some(file) if snapshot.contains(file) => file,
        other => {
            tracing::warn!(file = ?other, "file not in snapshot, skipping step");
            return None;
        }
    };

    let title = non_empty(step.title.as_deref());
    let description = non_empty(step.description.as_deref());
    let (Some(title), Some(description)) = (title, description) else {
        tracing::warn!(file, "step missing title or description, skipping");
        return None;
    };

    Some(ValidatedStep::new(
        title.to_string(),
        file.to_string(),
        step.positive_line(),
        description.to_string(),
        step.selection,
    ))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
