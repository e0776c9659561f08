//! Entry-point prioritization.
//!
//! Files are ranked 1 (most likely an entry point) to 4 by a declarative
//! rule table. The first matching rule wins; files matching nothing get
//! [`PriorityRank::Other`]. Ties are broken by path so the ordering, and
//! therefore the chunk boundaries, are reproducible.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::FileRecord;

/// Extensions treated as source code by the rules below.
const SOURCE_EXTENSIONS: &str = "ts|js|tsx|jsx|mjs|cjs|py|go|java|rb|rs|kt|cs|php|swift";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityRank {
    /// Canonical entry-point base name (`main.rs`, `index.ts`, ...).
    EntryPoint = 1,
    /// Entry-point name directly under `src/`, any extension.
    SourceRootEntry = 2,
    /// Any recognized source file directly under `src/`.
    SourceRootFile = 3,
    Other = 4,
}

impl PriorityRank {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Which part of the lowercased path a rule is matched against.
#[derive(Debug, Clone, Copy)]
enum Target {
    BaseName,
    Path,
}

struct Rule {
    rank: PriorityRank,
    target: Target,
    pattern: Regex,
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    let rule = |rank, target, pattern: String| Rule {
        rank,
        target,
        pattern: Regex::new(&pattern).expect("static priority pattern"),
    };
    vec![
        rule(
            PriorityRank::EntryPoint,
            Target::BaseName,
            format!(r"^(main|index|app|server|extension)\.({SOURCE_EXTENSIONS})$"),
        ),
        rule(
            PriorityRank::SourceRootEntry,
            Target::Path,
            r"^src/(main|index|app|extension)\.".to_string(),
        ),
        rule(
            PriorityRank::SourceRootFile,
            Target::Path,
            format!(r"^src/[^/]+\.({SOURCE_EXTENSIONS})$"),
        ),
    ]
});

/// Rank a path. Pure and total.
pub fn rank(path: &str) -> PriorityRank {
    let path = path.to_lowercase();
    let base = path.rsplit('/').next().unwrap_or(&path);
    RULES
        .iter()
        .find(|rule| match rule.target {
            Target::BaseName => rule.pattern.is_match(base),
            Target::Path => rule.pattern.is_match(&path),
        })
        .map(|rule| rule.rank)
        .unwrap_or(PriorityRank::Other)
}

/// Order files by rank, then by path.
pub fn prioritize(files: &[FileRecord]) -> Vec<&FileRecord> {
    let mut ranked: Vec<(PriorityRank, &FileRecord)> =
        files.iter().map(|f| (rank(&f.path), f)).collect();
    ranked.sort_by(|(ra, a), (rb, b)| ra.cmp(rb).then_with(|| a.path.cmp(&b.path)));
    ranked.into_iter().map(|(_, f)| f).collect()
}
