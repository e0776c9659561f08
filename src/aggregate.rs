//! Checkpoint aggregation.
//!
//! Concatenates successful chunk results in submission order and trims the
//! merged list to the global step target.

use crate::config::TrimPolicy;
use crate::models::{ChunkResult, RawStep};

/// Merge chunk results and trim to `target` steps.
///
/// Failed chunks contribute nothing. With [`TrimPolicy::Prefix`] the
/// earliest-generated steps are kept. With [`TrimPolicy::FirstPerChunk`]
/// steps are picked round-robin (every chunk's first step, then every
/// chunk's second, ...) and emitted back in generation order.
pub fn merge(results: &[ChunkResult], target: usize, policy: TrimPolicy) -> Vec<RawStep> {
    let per_chunk: Vec<&[RawStep]> = results
        .iter()
        .filter_map(|r| match r {
            ChunkResult::Steps(steps) => Some(steps.as_slice()),
            ChunkResult::Failed(_) => None,
        })
        .collect();

    let merged_len: usize = per_chunk.iter().map(|s| s.len()).sum();
    if merged_len <= target {
        return per_chunk.concat();
    }

    tracing::info!(generated = merged_len, target, ?policy, "trimming checkpoints");

    match policy {
        TrimPolicy::Prefix => per_chunk.concat().into_iter().take(target).collect(),
        TrimPolicy::FirstPerChunk => round_robin(&per_chunk, target),
    }
}

fn round_robin(per_chunk: &[&[RawStep]], target: usize) -> Vec<RawStep> {
    let mut keep: Vec<usize> = vec![0; per_chunk.len()];
    let mut picked = 0;
    let mut depth = 0;

    while picked < target {
        let mut progressed = false;
        for (i, steps) in per_chunk.iter().enumerate() {
            if picked == target {
                break;
            }
            if depth < steps.len() {
                keep[i] += 1;
                picked += 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
        depth += 1;
    }

    per_chunk
        .iter()
        .zip(keep)
        .flat_map(|(steps, n)| steps[..n].iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(prefix: &str, n: usize) -> ChunkResult {
        ChunkResult::Steps(
            (0..n)
                .map(|i| RawStep {
                    title: Some(format!("{}{}", prefix, i)),
                    ..Default::default()
                })
                .collect(),
        )
    }

    fn titles(steps: &[RawStep]) -> Vec<String> {
        steps.iter().filter_map(|s| s.title.clone()).collect()
    }

    #[test]
    fn failed_chunks_contribute_nothing() {
        let results = vec![
            steps("a", 2),
            ChunkResult::Failed("boom".into()),
            steps("c", 1),
        ];
        let merged = merge(&results, 15, TrimPolicy::Prefix);
        assert_eq!(titles(&merged), vec!["a0", "a1", "c0"]);
    }

    #[test]
    fn prefix_keeps_earliest_steps() {
        let results = vec![steps("a", 10), steps("b", 10), steps("c", 5)];
        let merged = merge(&results, 15, TrimPolicy::Prefix);
        assert_eq!(merged.len(), 15);
        assert_eq!(merged[9].title.as_deref(), Some("a9"));
        assert_eq!(merged[14].title.as_deref(), Some("b4"));
    }

    #[test]
    fn first_per_chunk_keeps_every_chunk_represented() {
        let results = vec![steps("a", 4), steps("b", 1), steps("c", 3)];
        let merged = merge(&results, 5, TrimPolicy::FirstPerChunk);
        assert_eq!(titles(&merged), vec!["a0", "a1", "b0", "c0", "c1"]);
    }

    #[test]
    fn under_target_is_untouched() {
        let results = vec![steps("a", 3)];
        for policy in [TrimPolicy::Prefix, TrimPolicy::FirstPerChunk] {
            assert_eq!(merge(&results, 3, policy).len(), 3);
        }
    }
}
