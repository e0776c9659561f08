//! End-to-end tour generation.
//!
//! ```text
//! snapshot ─▶ prioritize ─▶ partition ─▶ scheduler ─▶ aggregate ─▶ validate ─┐
//!     │                                                                      ├─▶ TourStepList
//!     └──────────────────────▶ overview (LLM, else static) ──────────────────┘
//! ```
//!
//! Cancellation is checked before chunking, before every completion
//! dispatch, and before assembly. Only [`TourError::TotalChunkFailure`] and
//! [`TourError::Cancelled`] end a run early; everything else degrades to a
//! shorter tour or the fallback welcome page.

use std::sync::Arc;

use crate::aggregate;
use crate::cancel::CancellationSignal;
use crate::completion::CompletionService;
use crate::config::Config;
use crate::error::TourError;
use crate::models::{RepositorySnapshot, TourStepList};
use crate::overview::OverviewGenerator;
use crate::partition::partition;
use crate::priority::{self, prioritize};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::prompt;
use crate::scheduler::ChunkScheduler;
use crate::tour::{self, CodeTour, TourOptions};
use crate::validate::validate;

pub struct TourPipeline {
    config: Config,
    service: Arc<dyn CompletionService>,
}

impl TourPipeline {
    pub fn new(config: Config, service: Arc<dyn CompletionService>) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every phase and return the ordered, validated step list.
    pub async fn generate_steps(
        &self,
        snapshot: &RepositorySnapshot,
        options: &TourOptions,
        progress: &dyn ProgressReporter,
        cancel: &dyn CancellationSignal,
    ) -> Result<TourStepList, TourError> {
        let generation = &self.config.generation;
        tracing::info!(
            files = snapshot.total_files(),
            lines = snapshot.total_lines(),
            model = self.service.model_name(),
            "starting tour generation"
        );

        progress.report(ProgressEvent::new("Building project context", 5.0));
        let context = prompt::project_context(snapshot, options);

        check(cancel)?;
        let ranked = prioritize(snapshot.files());
        if let (Some(first), Some(last)) = (ranked.first(), ranked.last()) {
            tracing::debug!(
                first = %first.path,
                first_rank = priority::rank(&first.path).as_u8(),
                last = %last.path,
                "files sorted, entry points first"
            );
        }
        let chunks = partition(&ranked, generation.files_per_chunk);
        tracing::info!(
            chunks = chunks.len(),
            files_per_chunk = generation.files_per_chunk,
            parallel = generation.parallel_chunks,
            "partitioned files"
        );

        check(cancel)?;
        progress.report(ProgressEvent::new("Analyzing codebase for overview", 10.0));
        let welcome = OverviewGenerator::new(
            self.service.as_ref(),
            &self.config.overview,
            generation.target_steps,
        )
        .generate(snapshot, &context)
        .await;

        let scheduler = ChunkScheduler::new(self.service.as_ref(), generation, progress, cancel);
        let results = scheduler.run(&chunks, &context).await?;

        check(cancel)?;
        progress.report(ProgressEvent::new("Validating checkpoints", 10.0));
        let merged = aggregate::merge(&results, generation.target_steps, generation.trim_policy);
        let body = validate(&merged, snapshot);

        let mut steps = TourStepList { welcome, body };
        if let Some(max) = options.max_steps.or(self.config.tour.max_steps) {
            steps.truncate(max);
        }

        progress.report(ProgressEvent::new("Tour generation complete", 15.0));
        tracing::info!(
            welcome = steps.welcome.is_some(),
            body = steps.body.len(),
            total = steps.len(),
            "tour generation complete"
        );
        Ok(steps)
    }

    /// [`generate_steps`](Self::generate_steps) followed by assembly.
    pub async fn generate_tour(
        &self,
        snapshot: &RepositorySnapshot,
        options: &TourOptions,
        progress: &dyn ProgressReporter,
        cancel: &dyn CancellationSignal,
    ) -> Result<CodeTour, TourError> {
        let steps = self
            .generate_steps(snapshot, options, progress, cancel)
            .await?;
        Ok(tour::assemble(steps, options))
    }
}

fn check(cancel: &dyn CancellationSignal) -> Result<(), TourError> {
    if cancel.is_cancelled() {
        tracing::info!("cancellation requested");
        return Err(TourError::Cancelled);
    }
    Ok(())
}
