//! Repository flattening front-end.
//!
//! Produces a [`RepositorySnapshot`] either by walking a directory or by
//! reading a JSON snapshot written by another flattening tool. The pipeline
//! itself never touches the filesystem.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::SnapshotConfig;
use crate::models::{FileRecord, RepositorySnapshot};

/// Walk `root` and read every included text file.
///
/// Paths are relative to `root` with `/` separators, sorted. Binary,
/// non-UTF-8 and oversized files are skipped.
pub fn scan_directory(root: &Path, config: &SnapshotConfig) -> Result<RepositorySnapshot> {
    if !root.is_dir() {
        bail!("Repository root does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/.tours/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        if entry.metadata()?.len() > config.max_file_bytes {
            tracing::debug!(path = %rel_str, "skipping oversized file");
            continue;
        }

        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        if bytes.contains(&0) {
            continue;
        }
        let Ok(content) = String::from_utf8(bytes) else {
            tracing::debug!(path = %rel_str, "skipping non-UTF-8 file");
            continue;
        };

        let language = detect_language(&rel_str);
        files.push(FileRecord::new(rel_str, content, language));
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::info!(files = files.len(), root = %root.display(), "repository scanned");
    Ok(RepositorySnapshot::new(files))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotFile {
    #[serde(default)]
    total_files: Option<usize>,
    #[serde(default)]
    total_lines: Option<usize>,
    files: Vec<SnapshotEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotEntry {
    path: String,
    content: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    line_count: Option<usize>,
}

/// Read a JSON snapshot: `{"files": [{"path", "content", "language", "lineCount"}]}`.
///
/// Missing languages are detected from the extension, missing line counts
/// and totals are computed. Paths must be unique.
pub fn load_snapshot_file(path: &Path) -> Result<RepositorySnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
    let parsed: SnapshotFile =
        serde_json::from_str(&content).with_context(|| "Failed to parse snapshot file")?;

    let mut seen = HashSet::new();
    let mut files = Vec::with_capacity(parsed.files.len());
    for entry in parsed.files {
        if !seen.insert(entry.path.clone()) {
            bail!("Duplicate path in snapshot file: {}", entry.path);
        }
        let language = entry
            .language
            .unwrap_or_else(|| detect_language(&entry.path).to_string());
        let mut record = FileRecord::new(entry.path, entry.content, language);
        if let Some(count) = entry.line_count {
            record.line_count = count;
        }
        files.push(record);
    }

    let total_files = parsed.total_files.unwrap_or(files.len());
    let total_lines = parsed
        .total_lines
        .unwrap_or_else(|| files.iter().map(|f| f.line_count).sum());

    Ok(RepositorySnapshot::with_totals(files, total_files, total_lines))
}

/// Language tag from a path's extension (or well-known file name).
pub fn detect_language(path: &str) -> &'static str {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    if name == "dockerfile" {
        return "dockerfile";
    }
    if name == "makefile" {
        return "makefile";
    }

    let ext = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext {
        "rs" => "rust",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "py" => "python",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "rb" => "ruby",
        "php" => "php",
        "cs" => "csharp",
        "swift" => "swift",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "md" | "markdown" => "markdown",
        "json" => "json",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        "html" | "htm" => "html",
        "css" | "scss" => "css",
        "sh" | "bash" => "shell",
        "sql" => "sql",
        _ => "text",
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
