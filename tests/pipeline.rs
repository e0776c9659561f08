//! End-to-end tests of the tour pipeline against a scripted completion
//! service. No network access: every reply is decided by the test.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tourgen::cancel::{CancelFlag, NeverCancel};
use tourgen::completion::{Completion, CompletionService, Message};
use tourgen::config::{Config, GenerationConfig};
use tourgen::error::{CompletionError, TourError};
use tourgen::models::{FileRecord, RepositorySnapshot};
use tourgen::pipeline::TourPipeline;
use tourgen::progress::{NoProgress, ProgressEvent, ProgressReporter};
use tourgen::tour::TourOptions;

// ─── Scripted service ───────────────────────────────────────────────

type ChunkScript = Box<dyn Fn(usize) -> (u64, Option<String>) + Send + Sync>;

/// Answers the overview request with `overview` and chunk `n` with `chunks(n)`.
struct ScriptedService {
    overview: Option<String>,
    chunks: ChunkScript,
    calls: AtomicUsize,
}

impl ScriptedService {
    fn new(overview: Option<String>, chunks: ChunkScript) -> Arc<Self> {
        Arc::new(Self {
            overview,
            chunks,
            calls: AtomicUsize::new(0),
        })
    }
}

fn chunk_number(user: &str) -> usize {
    let rest = &user[user.find("Chunk ").expect("chunk header") + 6..];
    rest.split_whitespace().next().unwrap().parse().unwrap()
}

#[async_trait]
impl CompletionService for ScriptedService {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[Message]) -> Result<Completion, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let reply = if messages[0].content.contains("Welcome checkpoint") {
            self.overview.clone()
        } else {
            let (delay_ms, reply) = (self.chunks)(chunk_number(&messages[1].content));
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            reply
        };

        reply
            .map(|content| Completion { content })
            .ok_or_else(|| CompletionError::Transport("connection refused".into()))
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

/// `README.md` plus `n` python modules, all ranked alike so chunk
/// membership follows path order: chunk k holds `lib/mXX.py` files.
fn snapshot(n: usize, with_readme: bool) -> RepositorySnapshot {
    let mut files: Vec<FileRecord> = (0..n)
        .map(|i| FileRecord::new(format!("lib/m{:02}.py", i), "x = 1\ny = 2\n", "python"))
        .collect();
    if with_readme {
        files.push(FileRecord::new("README.md", "# Demo\n\nA demo.\n", "markdown"));
    }
    RepositorySnapshot::new(files)
}

fn config(files_per_chunk: usize, parallel: usize, target: usize) -> Config {
    Config {
        generation: GenerationConfig {
            target_steps: target,
            files_per_chunk,
            parallel_chunks: parallel,
            batch_delay_ms: 0,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn steps_reply(steps: &[(&str, &str)]) -> String {
    let items: Vec<Value> = steps
        .iter()
        .map(|(file, title)| {
            json!({"title": title, "file": file, "line": 1, "description": format!("About {}", title)})
        })
        .collect();
    Value::Array(items).to_string()
}

fn overview_reply() -> Option<String> {
    Some(
        json!({"title": "Welcome - Demo", "file": "README.md", "line": 1, "description": "Overview."})
            .to_string(),
    )
}

fn titles(steps: &tourgen::models::TourStepList) -> Vec<String> {
    steps
        .clone()
        .into_steps()
        .iter()
        .map(|s| s.title().to_string())
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn welcome_first_then_chunks_in_submission_order() {
    // chunk 1 is the slowest to answer
    let service = ScriptedService::new(
        overview_reply(),
        Box::new(|n| {
            let delay = if n == 1 { 900 } else { 10 };
            let title = format!("c{}", n);
            (delay, Some(steps_reply(&[("lib/m00.py", title.as_str())])))
        }),
    );
    let pipeline = TourPipeline::new(config(2, 3, 15), service);

    let steps = pipeline
        .generate_steps(&snapshot(6, true), &TourOptions::default(), &NoProgress, &NeverCancel)
        .await
        .unwrap();

    // 7 files in pairs: 4 chunks, windows of 3 then 1
    assert_eq!(titles(&steps), vec!["Welcome - Demo", "c1", "c2", "c3", "c4"]);
}

#[tokio::test(start_paused = true)]
async fn single_chunk_failure_is_tolerated() {
    let service = ScriptedService::new(
        overview_reply(),
        Box::new(|n| match n {
            2 => (0, None),
            _ => (0, Some(steps_reply(&[("lib/m00.py", format!("c{}", n).as_str())]))),
        }),
    );
    let pipeline = TourPipeline::new(config(1, 2, 15), service);

    let steps = pipeline
        .generate_steps(&snapshot(3, true), &TourOptions::default(), &NoProgress, &NeverCancel)
        .await
        .unwrap();

    assert_eq!(titles(&steps), vec!["Welcome - Demo", "c1", "c3", "c4"]);
}

#[tokio::test(start_paused = true)]
async fn total_chunk_failure_is_fatal_and_names_count() {
    let service = ScriptedService::new(
        overview_reply(),
        Box::new(|n| match n {
            1 => (0, Some("I could not produce JSON, sorry.".into())),
            2 => (0, Some("{\"title\": \"object, not array\"}".into())),
            3 => (0, Some("[]".into())),
            _ => (0, None),
        }),
    );
    let pipeline = TourPipeline::new(config(1, 2, 15), service);

    let err = pipeline
        .generate_steps(&snapshot(4, false), &TourOptions::default(), &NoProgress, &NeverCancel)
        .await
        .unwrap_err();

    assert!(matches!(err, TourError::TotalChunkFailure { chunks: 4 }));
    assert!(err.to_string().contains("4 chunks"));
}

#[tokio::test(start_paused = true)]
async fn unknown_files_never_reach_the_tour() {
    let service = ScriptedService::new(
        overview_reply(),
        Box::new(|_| {
            (
                0,
                Some(steps_reply(&[
                    ("lib/m00.py", "real"),
                    ("lib/imaginary.py", "hallucinated"),
                ])),
            )
        }),
    );
    let pipeline = TourPipeline::new(config(5, 1, 15), service);

    let steps = pipeline
        .generate_steps(&snapshot(2, true), &TourOptions::default(), &NoProgress, &NeverCancel)
        .await
        .unwrap();

    assert_eq!(titles(&steps), vec!["Welcome - Demo", "real"]);
}

#[tokio::test(start_paused = true)]
async fn excess_steps_are_trimmed_to_the_leading_prefix() {
    // 5 chunks x 5 steps = 25 generated, target 15
    let service = ScriptedService::new(
        overview_reply(),
        Box::new(|n| {
            let file = format!("lib/m{:02}.py", n - 1);
            let titles: Vec<String> = (0..5).map(|i| format!("s{}", (n - 1) * 5 + i)).collect();
            let steps: Vec<(&str, &str)> = titles.iter().map(|t| (file.as_str(), t.as_str())).collect();
            (0, Some(steps_reply(&steps)))
        }),
    );
    let pipeline = TourPipeline::new(config(1, 5, 15), service);

    let steps = pipeline
        .generate_steps(&snapshot(5, false), &TourOptions::default(), &NoProgress, &NeverCancel)
        .await
        .unwrap();

    let expected: Vec<String> = (0..15).map(|i| format!("s{}", i)).collect();
    let body: Vec<String> = steps.body.iter().map(|s| s.title().to_string()).collect();
    assert_eq!(body, expected);
}

#[tokio::test(start_paused = true)]
async fn failed_overview_falls_back_to_readme_with_statistics() {
    let service = ScriptedService::new(
        None,
        Box::new(|_| (0, Some(steps_reply(&[("lib/m00.py", "body")])))),
    );
    let pipeline = TourPipeline::new(config(5, 1, 15), service);
    let snap = snapshot(3, true);

    let steps = pipeline
        .generate_steps(&snap, &TourOptions::default(), &NoProgress, &NeverCancel)
        .await
        .unwrap();

    let welcome = steps.welcome.as_ref().expect("fallback welcome");
    assert!(!welcome.title().is_empty());
    assert_eq!(welcome.file(), "README.md");
    assert!(welcome.description().contains(&format!("{} files", snap.total_files())));
    assert!(welcome.description().contains(&format!("{} lines", snap.total_lines())));
    assert_eq!(titles(&steps)[1], "body");
}

#[tokio::test(start_paused = true)]
async fn malformed_overview_without_readme_points_at_entry_point() {
    let service = ScriptedService::new(
        Some("{\"title\": \"missing the rest\"}".into()),
        Box::new(|_| (0, Some(steps_reply(&[("main.py", "entry")])))),
    );
    let pipeline = TourPipeline::new(config(5, 1, 15), service);
    let snap = RepositorySnapshot::new(vec![
        FileRecord::new("lib/util.py", "def f(): pass\n", "python"),
        FileRecord::new("main.py", "import lib.util\n", "python"),
    ]);

    let steps = pipeline
        .generate_steps(&snap, &TourOptions::default(), &NoProgress, &NeverCancel)
        .await
        .unwrap();

    assert_eq!(steps.welcome.as_ref().unwrap().file(), "main.py");
}

#[tokio::test(start_paused = true)]
async fn max_steps_caps_total_including_welcome() {
    let service = ScriptedService::new(
        overview_reply(),
        Box::new(|_| {
            let file = "lib/m00.py";
            (0, Some(steps_reply(&[(file, "a"), (file, "b"), (file, "c")])))
        }),
    );
    let pipeline = TourPipeline::new(config(1, 2, 15), service);
    let options = TourOptions {
        max_steps: Some(4),
        ..Default::default()
    };

    let steps = pipeline
        .generate_steps(&snapshot(2, true), &options, &NoProgress, &NeverCancel)
        .await
        .unwrap();

    assert_eq!(steps.len(), 4);
    assert!(steps.welcome.is_some());
}

#[tokio::test(start_paused = true)]
async fn cancellation_before_start_makes_no_calls() {
    let service = ScriptedService::new(
        overview_reply(),
        Box::new(|_| (0, Some(steps_reply(&[("lib/m00.py", "x")])))),
    );
    let pipeline = TourPipeline::new(config(1, 1, 15), Arc::clone(&service) as Arc<dyn CompletionService>);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let err = pipeline
        .generate_steps(&snapshot(2, true), &TourOptions::default(), &NoProgress, &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

struct Recorder(Mutex<Vec<ProgressEvent>>);

impl ProgressReporter for Recorder {
    fn report(&self, event: ProgressEvent) {
        self.0.lock().unwrap().push(event);
    }
}

#[tokio::test(start_paused = true)]
async fn progress_covers_every_phase() {
    let service = ScriptedService::new(
        overview_reply(),
        Box::new(|_| (0, Some(steps_reply(&[("lib/m00.py", "x")])))),
    );
    let pipeline = TourPipeline::new(config(1, 2, 15), service);
    let recorder = Recorder(Mutex::new(vec![]));

    pipeline
        .generate_steps(&snapshot(3, true), &TourOptions::default(), &recorder, &NeverCancel)
        .await
        .unwrap();

    let events = recorder.0.lock().unwrap();
    // context, overview, two windows, validation, completion
    assert_eq!(events.len(), 6);
    assert_eq!(events[1].message, "Analyzing codebase for overview");
    assert_eq!(events.last().unwrap().message, "Tour generation complete");
    let total: f64 = events.iter().map(|e| e.increment).sum();
    assert!((total - 100.0).abs() < 1e-6);
}

#[tokio::test]
async fn disabled_provider_cannot_produce_a_tour() {
    let pipeline = TourPipeline::new(
        config(5, 1, 15),
        Arc::new(tourgen::completion::DisabledCompletion),
    );

    let err = pipeline
        .generate_tour(&snapshot(7, true), &TourOptions::default(), &NoProgress, &NeverCancel)
        .await
        .unwrap_err();

    assert!(matches!(err, TourError::TotalChunkFailure { chunks: 2 }));
}
