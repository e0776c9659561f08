//! Prompt construction.
//!
//! Wording lives here and nowhere else. The scheduler and the overview
//! generator only decide *what* goes into a prompt: which files, how many
//! steps, and whether a chunk opens the tour or continues it.

use crate::completion::Message;
use crate::models::{FileRecord, RepositorySnapshot};
use crate::partition::Chunk;
use crate::tour::TourOptions;

/// Whether a chunk opens the tour or continues an earlier chunk's story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPosition {
    First,
    Continuing,
}

impl ChunkPosition {
    pub fn of(chunk: &Chunk<'_>) -> Self {
        if chunk.index == 0 {
            ChunkPosition::First
        } else {
            ChunkPosition::Continuing
        }
    }
}

/// Shared context block prepended to every user prompt.
pub fn project_context(snapshot: &RepositorySnapshot, options: &TourOptions) -> String {
    let mut context = format!(
        "Project: {}\nGoal: Create a narrative tour that helps developers understand how this codebase works.\n\n",
        options.project_name.as_deref().unwrap_or("Unknown Project")
    );

    if let Some(title) = &options.title {
        context.push_str(&format!("Tour Title: {}\n", title));
    }
    if let Some(description) = &options.description {
        context.push_str(&format!("Tour Description: {}\n", description));
    }
    if !options.focus_areas.is_empty() {
        context.push_str(&format!("Focus Areas: {}\n", options.focus_areas.join(", ")));
    }

    context.push_str(&format!(
        "\nFiles analyzed: {}\nTotal lines: {}\nLanguages: {}\n\n",
        snapshot.total_files(),
        snapshot.total_lines(),
        snapshot.languages().join(", ")
    ));

    context.push_str(
        "Instructions:\n\
         1. File previews are prefixed with their real line numbers (format: \"  12|code\").\n\
         2. Read the code yourself: classes, functions and imports are all visible.\n\
         3. Use those exact line numbers in tour steps.\n\
         4. Show how files connect into one system.\n",
    );

    context
}

/// Markdown preview of the first `max_lines` lines, with a line-number gutter.
pub fn file_preview(file: &FileRecord, max_lines: usize) -> String {
    let preview = file
        .content
        .lines()
        .take(max_lines)
        .enumerate()
        .map(|(idx, line)| format!("{:>4}|{}", idx + 1, line))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "### {}\n**Language:** {} | **Lines:** {}\n```{}\n{}\n```\n",
        file.path, file.language, file.line_count, file.language, preview
    )
}

/// System and user messages for one chunk.
pub fn chunk_messages(
    chunk: &Chunk<'_>,
    total_chunks: usize,
    target_steps: usize,
    lines_per_file: usize,
    project_context: &str,
) -> Vec<Message> {
    let number = chunk.number();
    let position = ChunkPosition::of(chunk);

    let position_rules = match position {
        ChunkPosition::First => {
            "This chunk opens the tour.\n\
             1. Checkpoint 1 MUST be the entry point: find where the application starts \
             (manifest \"main\" fields, bootstrap code, files imported by many that import few).\n\
             2. Then follow where that entry point leads.\n"
        }
        ChunkPosition::Continuing => {
            "These checkpoints continue the tour from earlier chunks.\n\
             1. Follow the logical flow: data flow, execution path, module dependencies.\n\
             2. Each checkpoint should read as the next natural step.\n"
        }
    };

    let system = format!(
        "You are a senior software engineer writing a guided tour of a codebase.\n\
         The tour is a sequence: each checkpoint leads to the next.\n\n\
         Create {target_steps} checkpoints for chunk {number}/{total_chunks}.\n\n\
         {position_rules}\n\
         Each checkpoint has:\n\
         - title: short and technical, e.g. \"Entry Point - Application Bootstrap\"\n\
         - file: the exact file path shown in the chunk\n\
         - line: where the checkpoint starts (1-{lines_per_file})\n\
         - description: 4-6 sentences on what the code does, why it exists, how it works, \
         and how it connects to the next checkpoint\n\n\
         Return ONLY a JSON array, no markdown:\n\
         [{{\"title\": \"...\", \"file\": \"src/main.rs\", \"line\": 1, \"description\": \"...\"}}]"
    );

    let summaries = chunk
        .files
        .iter()
        .map(|f| file_preview(f, lines_per_file))
        .collect::<Vec<_>>()
        .join("\n\n");

    let task = match position {
        ChunkPosition::First => {
            "Start with the entry point, then follow execution order (not alphabetical order)."
        }
        ChunkPosition::Continuing => "Build on what came before and keep following the architecture.",
    };

    let user = format!(
        "{project_context}\n\
         Chunk {number} of {total_chunks}\n\n\
         Files in this chunk:\n{summaries}\n\n\
         Create {target_steps} checkpoints that explain how this code works. {task}"
    );

    vec![Message::system(system), Message::user(user)]
}

/// Inputs for the overview request, gathered by the overview generator.
pub struct OverviewPrompt<'a> {
    pub snapshot: &'a RepositorySnapshot,
    pub entry_point: &'a FileRecord,
    pub suggested_file: &'a str,
    pub readme_excerpt: Option<&'a str>,
    pub digest: &'a str,
    pub project_context: &'a str,
}

/// System and user messages for the welcome overview.
pub fn overview_messages(input: &OverviewPrompt<'_>) -> Vec<Message> {
    let system = format!(
        "You are a senior software architect seeing this codebase for the first time.\n\
         Write a Welcome checkpoint that gives a high-level overview of the project, based on the code.\n\n\
         Cover:\n\
         1. Project purpose: what problem it solves\n\
         2. Architecture: components, layers, modules\n\
         3. Key execution flows, starting at the entry point\n\
         4. Primary use cases\n\
         5. Technology stack: frameworks, libraries, tools\n\
         6. Entry points: where to start reading\n\n\
         Analyze the code snippets, not only the README.\n\n\
         Return ONLY a JSON object, no markdown:\n\
         {{\"title\": \"Welcome - Project Overview\", \"file\": \"{}\", \"line\": 1, \
         \"description\": \"multi-paragraph markdown overview\"}}",
        input.suggested_file
    );

    let snapshot = input.snapshot;
    let user = format!(
        "{context}\n\
         Codebase statistics:\n\
         - {files} files\n\
         - {lines} lines\n\
         - Languages: {languages}\n\
         - Entry Point: {entry}\n\n\
         README:\n{readme}\n\n\
         Key files:\n{digest}\n\n\
         Explain what the project is, how it is built, its main flows (trace from {entry}), \
         its use cases, its technologies, and where to start. Name real files and directories.",
        context = input.project_context,
        files = snapshot.total_files(),
        lines = crate::progress::format_number(snapshot.total_lines() as u64),
        languages = snapshot.languages().join(", "),
        entry = input.entry_point.path,
        readme = input.readme_excerpt.unwrap_or("No README available"),
        digest = input.digest,
    );

    vec![Message::system(system), Message::user(user)]
}
