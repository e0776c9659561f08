//! TOML configuration.
//!
//! Every section and key has a default, so an empty file (or no file at all,
//! see [`load_or_default`]) yields a working configuration. The completion
//! API key is never read from here; it comes from `OPENAI_API_KEY`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub overview: OverviewConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub tour: TourConfig,
}

/// How excess body steps are trimmed down to `target_steps`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TrimPolicy {
    /// Keep the leading prefix in generation order.
    #[default]
    Prefix,
    /// Keep each chunk's first step, then fill round-robin.
    FirstPerChunk,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_target_steps")]
    pub target_steps: usize,
    #[serde(default = "default_files_per_chunk")]
    pub files_per_chunk: usize,
    #[serde(default = "default_lines_per_file")]
    pub lines_per_file: usize,
    #[serde(default = "default_parallel_chunks")]
    pub parallel_chunks: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    #[serde(default)]
    pub trim_policy: TrimPolicy,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            target_steps: default_target_steps(),
            files_per_chunk: default_files_per_chunk(),
            lines_per_file: default_lines_per_file(),
            parallel_chunks: default_parallel_chunks(),
            batch_delay_ms: default_batch_delay_ms(),
            trim_policy: TrimPolicy::default(),
        }
    }
}

fn default_target_steps() -> usize {
    15
}
fn default_files_per_chunk() -> usize {
    5
}
fn default_lines_per_file() -> usize {
    25
}
fn default_parallel_chunks() -> usize {
    10
}
fn default_batch_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverviewConfig {
    #[serde(default = "default_max_key_files")]
    pub max_key_files: usize,
    #[serde(default = "default_candidate_window")]
    pub candidate_window: usize,
    #[serde(default = "default_preview_lines")]
    pub preview_lines: usize,
    #[serde(default = "default_readme_excerpt_chars")]
    pub readme_excerpt_chars: usize,
    #[serde(default = "default_readme_budget_chars")]
    pub readme_budget_chars: usize,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            max_key_files: default_max_key_files(),
            candidate_window: default_candidate_window(),
            preview_lines: default_preview_lines(),
            readme_excerpt_chars: default_readme_excerpt_chars(),
            readme_budget_chars: default_readme_budget_chars(),
        }
    }
}

fn default_max_key_files() -> usize {
    10
}
fn default_candidate_window() -> usize {
    20
}
fn default_preview_lines() -> usize {
    40
}
fn default_readme_excerpt_chars() -> usize {
    2000
}
fn default_readme_budget_chars() -> usize {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CompletionConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*".to_string()]
}
fn default_max_file_bytes() -> u64 {
    256 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct TourConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub max_steps: Option<usize>,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_steps: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".tours")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load the file when it exists, otherwise fall back to defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    let generation = &config.generation;
    if generation.target_steps == 0 {
        anyhow::bail!("generation.target_steps must be > 0");
    }
    if generation.files_per_chunk == 0 {
        anyhow::bail!("generation.files_per_chunk must be > 0");
    }
    if generation.parallel_chunks == 0 {
        anyhow::bail!("generation.parallel_chunks must be > 0");
    }

    if config.overview.max_key_files == 0 {
        anyhow::bail!("overview.max_key_files must be > 0");
    }

    if config.tour.max_steps == Some(0) {
        anyhow::bail!("tour.max_steps must be > 0 when set");
    }

    match config.completion.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown completion provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(())
}
