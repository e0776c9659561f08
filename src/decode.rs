//! Decoding of model replies.
//!
//! Models often wrap JSON in Markdown code fences even when told not to.
//! Only that outer wrapper is stripped before parsing; fences inside string
//! values belong to the Markdown descriptions and are kept. Anything that
//! still does not parse, or parses to the wrong shape, is an error for the
//! caller to recover from.

use serde_json::Value;

use crate::error::{json_kind, ChunkError, OverviewError};
use crate::models::RawStep;

/// Trim, then remove one leading fence line (```` ```json ````, ```` ``` ````)
/// and one trailing ```` ``` ```` if the reply is wrapped in them.
pub fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // the opening line carries at most a language tag
    let Some((_, body)) = after_open.split_once('\n') else {
        return trimmed.to_string();
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}

/// Decode a chunk reply into its raw steps.
///
/// The reply must be a non-empty JSON array. Individual elements are not
/// judged here; the validator does that.
pub fn decode_step_array(content: &str) -> Result<Vec<RawStep>, ChunkError> {
    let cleaned = strip_code_fences(content);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| ChunkError::NotJson(e.to_string()))?;

    let items = match &value {
        Value::Array(items) => items,
        other => return Err(ChunkError::NotArray(json_kind(other))),
    };

    if items.is_empty() {
        return Err(ChunkError::EmptyArray);
    }

    Ok(items.iter().map(RawStep::from_value).collect())
}

/// Decode the overview reply into a single raw step.
pub fn decode_overview(content: &str) -> Result<RawStep, OverviewError> {
    let cleaned = strip_code_fences(content);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| OverviewError::NotJson(e.to_string()))?;

    if !value.is_object() {
        return Err(OverviewError::NotObject(json_kind(&value)));
    }

    Ok(RawStep::from_value(&value))
}
