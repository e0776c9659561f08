//! Tour generation progress reporting.
//!
//! The pipeline emits [`ProgressEvent`]s at phase boundaries (context,
//! overview, each chunk window, assembly, completion). Events are advisory:
//! reporters never influence control flow. Output goes to **stderr** so
//! stdout remains parseable when the tour is printed there.

use std::io::Write;

/// A progress step: what is happening and how much of the bar it fills.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressEvent {
    pub message: String,
    pub increment: f64,
}

impl ProgressEvent {
    pub fn new(message: impl Into<String>, increment: f64) -> Self {
        Self {
            message: message.into(),
            increment,
        }
    }
}

/// Receives progress events. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "[ 35%] Analyzing chunk window 1/3".
pub struct StderrProgress {
    done: std::sync::Mutex<f64>,
}

impl StderrProgress {
    pub fn new() -> Self {
        Self {
            done: std::sync::Mutex::new(0.0),
        }
    }
}

impl Default for StderrProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let pct = match self.done.lock() {
            Ok(mut done) => {
                *done = (*done + event.increment).min(100.0);
                *done
            }
            Err(_) => 0.0,
        };
        let line = format!("[{:>3.0}%] {}\n", pct, event.message);
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = serde_json::json!({
            "event": "progress",
            "message": event.message,
            "increment": event.increment,
        });
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Format an integer with thousands separators: `1234567` → `"1,234,567"`.
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress::new()),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
