//! Error taxonomy for tour generation.
//!
//! Only [`TourError`] ever reaches the caller of the pipeline. The other
//! enums describe failures that are recovered locally: a failed chunk
//! contributes no steps, a failed overview falls back to the static
//! welcome page, and a failed completion call surfaces as one of those two.

use thiserror::Error;

/// Failure of a single completion-service call.
///
/// Kept separate from decoding errors so a transport problem can be told
/// apart from a successful-but-malformed response.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("completion provider is disabled")]
    Disabled,

    #[error("{0} environment variable not set")]
    MissingApiKey(&'static str),

    #[error("completion API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion transport error: {0}")]
    Transport(String),

    #[error("completion response had no message content")]
    EmptyResponse,
}

/// Why one chunk produced no steps.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    #[error("invalid response format (expected array, got {0})")]
    NotArray(&'static str),

    #[error("response array is empty")]
    EmptyArray,
}

/// Why the model-written overview was rejected in favour of the fallback.
#[derive(Error, Debug)]
pub enum OverviewError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    #[error("invalid response format (expected object, got {0})")]
    NotObject(&'static str),

    #[error("response missing required field `{0}`")]
    MissingField(&'static str),

    #[error("response references unknown file: {0}")]
    UnknownFile(String),
}

/// Terminal outcomes of a tour-generation request.
#[derive(Error, Debug)]
pub enum TourError {
    #[error("failed to generate any checkpoints: all {chunks} chunks failed")]
    TotalChunkFailure { chunks: usize },

    #[error("tour generation cancelled")]
    Cancelled,
}

impl TourError {
    /// True for the cancellation outcome, which callers usually report
    /// without error styling.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TourError::Cancelled)
    }
}

/// Short name of a JSON value's kind, used in format errors.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
