//! Tour assembly and persistence.
//!
//! Wraps the validated step list into a CodeTour document
//! (`https://aka.ms/codetour-schema`) and writes it as `<slug>.tour`.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::models::{TourStepList, ValidatedStep};

const SCHEMA_URL: &str = "https://aka.ms/codetour-schema";
const DEFAULT_DESCRIPTION: &str =
    "This tour was automatically generated from the repository contents with a language model.";

/// Caller-supplied knobs for one generation request.
#[derive(Debug, Clone, Default)]
pub struct TourOptions {
    pub project_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub focus_areas: Vec<String>,
    /// Hard cap on the total step count, welcome included.
    pub max_steps: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeTour {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub title: String,
    pub description: String,
    pub steps: Vec<ValidatedStep>,
}

/// Build the tour document. Missing title/description get defaults.
pub fn assemble(steps: TourStepList, options: &TourOptions) -> CodeTour {
    let title = options.title.clone().unwrap_or_else(|| {
        format!(
            "AI Generated Tour - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )
    });

    CodeTour {
        schema: SCHEMA_URL.to_string(),
        title,
        description: options
            .description
            .clone()
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        steps: steps.into_steps(),
    }
}

/// `"My Tour: v2"` → `"my-tour-v2.tour"`.
pub fn file_name(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    format!("{}.tour", slug)
}

/// Write the tour as pretty JSON into `dir`, returning the file path.
pub fn write_tour(tour: &CodeTour, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create tour directory: {}", dir.display()))?;

    let path = dir.join(file_name(&tour.title));
    let json = serde_json::to_string_pretty(tour)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write tour file: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn step(title: &str, line: Option<u32>) -> ValidatedStep {
        ValidatedStep::new(title.into(), "src/main.rs".into(), line, "d".into(), None)
    }

    #[test]
    fn file_name_slugifies_title() {
        assert_eq!(file_name("My Tour: v2"), "my-tour-v2.tour");
        assert_eq!(file_name("  Spaced   Out  "), "spaced-out.tour");
        assert_eq!(file_name("snake_case-ok"), "snake_case-ok.tour");
    }

    #[test]
    fn assemble_puts_welcome_first_and_uses_defaults() {
        let list = TourStepList {
            welcome: Some(step("welcome", Some(1))),
            body: vec![step("body", None)],
        };
        let tour = assemble(list, &TourOptions::default());
        assert!(tour.title.starts_with("AI Generated Tour - "));
        assert_eq!(tour.description, DEFAULT_DESCRIPTION);
        assert_eq!(tour.steps[0].title(), "welcome");
    }

    #[test]
    fn write_tour_omits_absent_fields() {
        let tmp = TempDir::new().unwrap();
        let options = TourOptions {
            title: Some("Getting Started".into()),
            ..Default::default()
        };
        let tour = assemble(
            TourStepList {
                welcome: None,
                body: vec![step("only", None)],
            },
            &options,
        );
        let path = write_tour(&tour, &tmp.path().join(".tours")).unwrap();
        assert_eq!(path.file_name().unwrap(), "getting-started.tour");

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["$schema"], SCHEMA_URL);
        assert!(value["steps"][0].get("line").is_none());
        assert!(value["steps"][0].get("selection").is_none());
    }
}
