//! Welcome-step generation.
//!
//! Two tiers. First the model is asked for a holistic project summary built
//! from a small set of key files. If that call fails, returns something that
//! is not a JSON object, or leaves out a required field, a deterministic
//! welcome page is assembled from repository statistics and the README.
//! The fallback never fails for a non-empty snapshot.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::completion::CompletionService;
use crate::config::OverviewConfig;
use crate::decode;
use crate::error::OverviewError;
use crate::models::{FileRecord, RepositorySnapshot, ValidatedStep};
use crate::priority::prioritize;
use crate::prompt::{self, OverviewPrompt};

/// Project manifests, most specific first. Matched against top-level paths.
pub const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "cargo.toml",
    "pyproject.toml",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "composer.json",
    "gemfile",
    "setup.py",
];

const TRUNCATION_MARKER: &str = "...\n\n[Content truncated - see the full README for more details]";

static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("static regex"));

pub struct OverviewGenerator<'a> {
    service: &'a dyn CompletionService,
    config: &'a OverviewConfig,
    target_steps: usize,
}

impl<'a> OverviewGenerator<'a> {
    pub fn new(
        service: &'a dyn CompletionService,
        config: &'a OverviewConfig,
        target_steps: usize,
    ) -> Self {
        Self {
            service,
            config,
            target_steps,
        }
    }

    /// Produce the welcome step, or `None` for an empty snapshot.
    pub async fn generate(
        &self,
        snapshot: &RepositorySnapshot,
        project_context: &str,
    ) -> Option<ValidatedStep> {
        if snapshot.is_empty() {
            tracing::warn!("no files found for welcome page");
            return None;
        }

        match self.generate_from_model(snapshot, project_context).await {
            Ok(step) => {
                tracing::info!(title = step.title(), "welcome checkpoint generated");
                Some(step)
            }
            Err(e) => {
                tracing::warn!(error = %e, "overview generation failed, using static welcome page");
                static_welcome(snapshot, self.target_steps, self.config.readme_budget_chars)
            }
        }
    }

    async fn generate_from_model(
        &self,
        snapshot: &RepositorySnapshot,
        project_context: &str,
    ) -> Result<ValidatedStep, OverviewError> {
        let ranked = prioritize(snapshot.files());
        let entry_point = ranked[0];
        let readme = snapshot.readme();
        let key_files = select_key_files(snapshot, self.config);

        tracing::debug!(
            entry_point = %entry_point.path,
            key_files = key_files.len(),
            "requesting overview"
        );

        let digest = build_digest(&key_files, self.config.preview_lines);
        let readme_excerpt =
            readme.map(|f| truncate_chars(&f.content, self.config.readme_excerpt_chars));
        let suggested_file = readme.unwrap_or(entry_point).path.as_str();

        let messages = prompt::overview_messages(&OverviewPrompt {
            snapshot,
            entry_point,
            suggested_file,
            readme_excerpt,
            digest: &digest,
            project_context,
        });

        let completion = self.service.complete(&messages).await?;
        let raw = decode::decode_overview(&completion.content)?;

        let title = required(raw.title.as_deref(), "title")?;
        let file = required(raw.file.as_deref(), "file")?;
        let description = required(raw.description.as_deref(), "description")?;
        if !snapshot.contains(file) {
            return Err(OverviewError::UnknownFile(file.to_string()));
        }

        Ok(ValidatedStep::new(
            title.to_string(),
            file.to_string(),
            Some(raw.positive_line().unwrap_or(1)),
            description.to_string(),
            None,
        ))
    }
}

fn required<'s>(value: Option<&'s str>, field: &'static str) -> Result<&'s str, OverviewError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(OverviewError::MissingField(field))
}

/// Top-level project manifest, if any.
pub fn find_manifest(snapshot: &RepositorySnapshot) -> Option<&FileRecord> {
    MANIFEST_FILES.iter().find_map(|name| {
        snapshot
            .files()
            .iter()
            .find(|f| f.path.to_lowercase() == *name)
    })
}

/// Pick up to `max_key_files` files: entry point, manifest, then the next
/// best-ranked files that are neither README nor manifest.
pub fn select_key_files<'s>(
    snapshot: &'s RepositorySnapshot,
    config: &OverviewConfig,
) -> Vec<&'s FileRecord> {
    let ranked = prioritize(snapshot.files());
    let Some(entry_point) = ranked.first().copied() else {
        return Vec::new();
    };
    let manifest = find_manifest(snapshot);

    let mut keys = vec![entry_point];
    if let Some(manifest) = manifest {
        if manifest.path != entry_point.path {
            keys.push(manifest);
        }
    }

    for file in ranked
        .iter()
        .skip(1)
        .take(config.candidate_window.saturating_sub(1))
    {
        if keys.len() >= config.max_key_files {
            break;
        }
        if file.is_readme() || manifest.is_some_and(|m| m.path == file.path) {
            continue;
        }
        keys.push(file);
    }

    keys.truncate(config.max_key_files);
    keys
}

/// Per-file header plus the first `preview_lines` lines.
pub fn build_digest(files: &[&FileRecord], preview_lines: usize) -> String {
    files
        .iter()
        .map(|file| {
            let preview = file
                .content
                .lines()
                .take(preview_lines)
                .collect::<Vec<_>>()
                .join("\n");
            let marker = if file.content.lines().count() > preview_lines {
                "\n... (truncated)"
            } else {
                ""
            };
            format!(
                "### File: {} ({}, {} lines)\n```{}\n{}{}\n```",
                file.path, file.language, file.line_count, file.language, preview, marker
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Deterministic welcome page from repository statistics.
///
/// Points at the README when there is one, otherwise at the top-ranked
/// entry point. Returns `None` only for an empty snapshot.
pub fn static_welcome(
    snapshot: &RepositorySnapshot,
    target_steps: usize,
    readme_budget: usize,
) -> Option<ValidatedStep> {
    let entry_point = prioritize(snapshot.files()).first().copied()?;
    let readme = snapshot.readme();
    let welcome_file = readme.unwrap_or(entry_point);

    let mut description = String::from("# Codebase Architecture Tour\n\n");
    description.push_str(
        "This tour walks through the system architecture, design patterns, and implementation details.\n\n",
    );
    description.push_str("## Codebase Overview\n");
    description.push_str(&format!(
        "- **{} files** totaling {} lines of code\n",
        snapshot.total_files(),
        snapshot.total_lines()
    ));
    description.push_str(&format!(
        "- **Technology Stack**: {}\n",
        snapshot.languages().join(", ")
    ));
    description.push_str(&format!("- **Entry Point**: {}\n", entry_point.path));
    description.push_str(&format!(
        "- **Tour Checkpoints**: {}+ key architectural components\n\n",
        target_steps
    ));
    description.push_str("## What This Tour Covers\n");
    description.push_str("- **System Architecture**: component structure and module organization\n");
    description.push_str("- **Data Flow**: request handling, state management, processing pipelines\n");
    description.push_str("- **Design Patterns**: the recurring patterns the code relies on\n");
    description.push_str("- **Technical Decisions**: implementation trade-offs\n\n");
    description.push_str("## How to Navigate\n");
    description.push_str("- Read the checkpoints in order for the full picture\n");
    description.push_str("- Each checkpoint explains one component and how it connects to the next\n\n");

    match readme {
        Some(readme) => {
            description.push_str("---\n\n## Project Information\n");
            description.push_str(&clean_readme(&readme.content, readme_budget));
        }
        None => {
            description.push_str("---\n\n## Starting Point\n");
            description.push_str(&format!(
                "No README found. This tour starts at the entry point: **{}**\n\n",
                entry_point.path
            ));
            description.push_str("Click \"Next\" to begin exploring from the application entry point.");
        }
    }

    tracing::info!(file = %welcome_file.path, readme = readme.is_some(), "static welcome page built");

    Some(ValidatedStep::new(
        "Welcome to the Codebase".to_string(),
        welcome_file.path.clone(),
        Some(1),
        description,
        None,
    ))
}

/// Collapse runs of blank lines and cap the length at `budget` characters.
pub fn clean_readme(readme: &str, budget: usize) -> String {
    let normalized = readme.replace("\r\n", "\n");
    let cleaned = BLANK_RUNS.replace_all(&normalized, "\n\n");

    if cleaned.chars().count() > budget {
        format!("{}{}", truncate_chars(&cleaned, budget), TRUNCATION_MARKER)
    } else {
        cleaned.into_owned()
    }
}

/// First `max` characters of `s`, on a char boundary.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
