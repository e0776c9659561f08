//! Bounded-parallel chunk dispatch.
//!
//! Chunks are sent to the completion service in windows of at most
//! `parallel_chunks`. Windows run one after another with a pacing delay in
//! between; chunks inside a window run concurrently. Each chunk writes its
//! outcome into the slot for its position, so the returned results follow
//! submission order no matter which request finishes first.
//!
//! A failed chunk only costs its own steps. If every chunk fails the run
//! fails with [`TourError::TotalChunkFailure`].

use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;

use crate::cancel::CancellationSignal;
use crate::completion::CompletionService;
use crate::config::GenerationConfig;
use crate::decode;
use crate::error::{ChunkError, TourError};
use crate::models::{ChunkResult, RawStep};
use crate::partition::Chunk;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::prompt;

/// Share of the progress bar spent on chunk windows.
const CHUNK_PROGRESS_WEIGHT: f64 = 60.0;

pub struct ChunkScheduler<'a> {
    service: &'a dyn CompletionService,
    config: &'a GenerationConfig,
    progress: &'a dyn ProgressReporter,
    cancel: &'a dyn CancellationSignal,
}

/// Steps requested from each chunk so the chunks together reach the target.
pub fn steps_per_chunk(target_steps: usize, chunk_count: usize) -> usize {
    if chunk_count == 0 {
        return 0;
    }
    target_steps.div_ceil(chunk_count)
}

impl<'a> ChunkScheduler<'a> {
    pub fn new(
        service: &'a dyn CompletionService,
        config: &'a GenerationConfig,
        progress: &'a dyn ProgressReporter,
        cancel: &'a dyn CancellationSignal,
    ) -> Self {
        Self {
            service,
            config,
            progress,
            cancel,
        }
    }

    /// Process every chunk and return one result per chunk, in chunk order.
    ///
    /// Cancellation is checked before each window is dispatched.
    pub async fn run(
        &self,
        chunks: &[Chunk<'_>],
        project_context: &str,
    ) -> Result<Vec<ChunkResult>, TourError> {
        let total = chunks.len();
        let per_chunk = steps_per_chunk(self.config.target_steps, total);
        let window_size = self.config.parallel_chunks.max(1);
        let window_count = total.div_ceil(window_size);
        let pacing = Duration::from_millis(self.config.batch_delay_ms);

        tracing::info!(
            chunks = total,
            windows = window_count,
            steps_per_chunk = per_chunk,
            "dispatching chunks"
        );

        let mut slots: Vec<Option<ChunkResult>> = (0..total).map(|_| None).collect();

        for (window_idx, window) in chunks.chunks(window_size).enumerate() {
            if window_idx > 0 && !pacing.is_zero() {
                tracing::debug!(?pacing, "waiting before next window");
                tokio::time::sleep(pacing).await;
            }

            if self.cancel.is_cancelled() {
                return Err(TourError::Cancelled);
            }

            let window_start = window_idx * window_size;
            self.progress.report(ProgressEvent::new(
                format!(
                    "Analyzing chunks {}-{} of {}",
                    window_start + 1,
                    window_start + window.len(),
                    total
                ),
                CHUNK_PROGRESS_WEIGHT * window.len() as f64 / total as f64,
            ));

            let mut in_flight: FuturesUnordered<_> = window
                .iter()
                .enumerate()
                .map(|(offset, chunk)| {
                    let slot = window_start + offset;
                    async move {
                        let outcome = self.process_chunk(chunk, total, per_chunk, project_context).await;
                        (slot, chunk.number(), outcome)
                    }
                })
                .collect();

            while let Some((slot, number, outcome)) = in_flight.next().await {
                slots[slot] = Some(match outcome {
                    Ok(steps) => {
                        tracing::info!(chunk = number, steps = steps.len(), "chunk done");
                        ChunkResult::Steps(steps)
                    }
                    Err(e) => {
                        tracing::warn!(chunk = number, error = %e, "chunk failed");
                        ChunkResult::Failed(e.to_string())
                    }
                });
            }
        }

        let results: Vec<ChunkResult> = slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| ChunkResult::Failed("chunk was not dispatched".into())))
            .collect();

        if results.iter().all(ChunkResult::is_failure) {
            tracing::error!(chunks = total, "no checkpoints generated from any chunk");
            return Err(TourError::TotalChunkFailure { chunks: total });
        }

        Ok(results)
    }

    async fn process_chunk(
        &self,
        chunk: &Chunk<'_>,
        total_chunks: usize,
        target_steps: usize,
        project_context: &str,
    ) -> Result<Vec<RawStep>, ChunkError> {
        tracing::debug!(chunk = chunk.number(), files = chunk.len(), "sending chunk");

        let messages = prompt::chunk_messages(
            chunk,
            total_chunks,
            target_steps,
            self.config.lines_per_file,
            project_context,
        );
        let completion = self.service.complete(&messages).await?;
        decode::decode_step_array(&completion.content)
    }
}
