//! Core data models used throughout tourgen.
//!
//! The snapshot types are read-only input. Steps come in two flavours:
//! [`RawStep`] is whatever the model produced and is never trusted;
//! [`ValidatedStep`] is only created by the validator and the overview
//! generator, after the file and required fields have been checked.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// One file of the flattened repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub path: String,
    pub content: String,
    pub language: String,
    pub line_count: usize,
}

impl FileRecord {
    /// Build a record, counting lines from the content.
    pub fn new(
        path: impl Into<String>,
        content: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let line_count = content.lines().count();
        Self {
            path: path.into(),
            content,
            language: language.into(),
            line_count,
        }
    }

    /// Lowercased final path segment.
    pub fn base_name(&self) -> String {
        self.path
            .rsplit('/')
            .next()
            .unwrap_or(&self.path)
            .to_lowercase()
    }

    pub fn is_readme(&self) -> bool {
        self.path.to_lowercase().contains("readme")
    }
}

/// Immutable, request-scoped view of the repository.
#[derive(Debug, Clone)]
pub struct RepositorySnapshot {
    files: Vec<FileRecord>,
    total_files: usize,
    total_lines: usize,
    paths: HashSet<String>,
}

impl RepositorySnapshot {
    /// Build a snapshot whose totals are derived from the files.
    pub fn new(files: Vec<FileRecord>) -> Self {
        let total_files = files.len();
        let total_lines = files.iter().map(|f| f.line_count).sum();
        Self::with_totals(files, total_files, total_lines)
    }

    /// Build a snapshot with totals reported by the flattening step.
    ///
    /// The totals may differ from the file list (e.g. when the flattener
    /// counted files it later filtered out); they are only used for display.
    pub fn with_totals(files: Vec<FileRecord>, total_files: usize, total_lines: usize) -> Self {
        let paths = files.iter().map(|f| f.path.clone()).collect();
        Self {
            files,
            total_files,
            total_lines,
            paths,
        }
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Exact, case-sensitive path lookup.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Distinct language tags in first-seen order.
    pub fn languages(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.files
            .iter()
            .map(|f| f.language.as_str())
            .filter(|lang| seen.insert(*lang))
            .collect()
    }

    /// First README-like file in snapshot order.
    pub fn readme(&self) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.is_readme())
    }
}

/// A cursor position inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

/// A highlighted range. Passed through from the model without checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

/// Untrusted step as produced by the completion service.
///
/// Every field is optional and `line` keeps its raw JSON form so the
/// validator can decide whether it is usable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStep {
    pub title: Option<String>,
    pub file: Option<String>,
    pub line: Option<Value>,
    pub description: Option<String>,
    pub selection: Option<Selection>,
}

impl RawStep {
    /// Lift one element of a model response into a raw step.
    ///
    /// Non-object values and fields of the wrong JSON type become `None`;
    /// nothing here fails.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            title: text("title"),
            file: text("file"),
            line: value.get("line").filter(|v| !v.is_null()).cloned(),
            description: text("description"),
            selection: value
                .get("selection")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
        }
    }

    /// `line` as a positive integer, if it is one.
    pub fn positive_line(&self) -> Option<u32> {
        self.line
            .as_ref()
            .and_then(Value::as_u64)
            .filter(|n| *n > 0)
            .and_then(|n| u32::try_from(n).ok())
    }
}

/// A step that passed validation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedStep {
    title: String,
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    selection: Option<Selection>,
}

impl ValidatedStep {
    pub(crate) fn new(
        title: String,
        file: String,
        line: Option<u32>,
        description: String,
        selection: Option<Selection>,
    ) -> Self {
        Self {
            title,
            file,
            line,
            description,
            selection,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }
}

/// Outcome of one chunk: its steps, or why it produced none.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkResult {
    Steps(Vec<RawStep>),
    Failed(String),
}

impl ChunkResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, ChunkResult::Failed(_))
    }
}

/// Final ordered output: welcome first, then body steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TourStepList {
    pub welcome: Option<ValidatedStep>,
    pub body: Vec<ValidatedStep>,
}

impl TourStepList {
    pub fn len(&self) -> usize {
        self.body.len() + usize::from(self.welcome.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop body steps from the end until at most `max` steps remain.
    pub fn truncate(&mut self, max: usize) {
        let body_budget = max.saturating_sub(usize::from(self.welcome.is_some()));
        self.body.truncate(body_budget);
        if max == 0 {
            self.welcome = None;
        }
    }

    /// Flatten into a single ordered sequence.
    pub fn into_steps(self) -> Vec<ValidatedStep> {
        self.welcome.into_iter().chain(self.body).collect()
    }
}
