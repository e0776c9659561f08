//! # tourgen CLI
//!
//! ```bash
//! tourgen --config ./config/tourgen.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tourgen generate [ROOT]` | Generate a tour and write it to `.tours/` |
//! | `tourgen plan [ROOT]` | Show file priorities and chunk boundaries without calling the model |
//! | `tourgen completions <shell>` | Print shell completion script |
//!
//! ## Examples
//!
//! ```bash
//! # Tour of the current directory
//! OPENAI_API_KEY=sk-... tourgen generate
//!
//! # Named tour focused on two areas, printed to stdout
//! tourgen generate ../service --title "Request Path" --focus routing --focus storage --stdout
//!
//! # Use a snapshot produced by another flattening tool
//! tourgen generate --snapshot repo.json
//! ```

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use tourgen::cancel::CancelFlag;
use tourgen::completion;
use tourgen::config::{self, Config};
use tourgen::models::RepositorySnapshot;
use tourgen::overview;
use tourgen::partition::partition;
use tourgen::pipeline::TourPipeline;
use tourgen::priority::{self, prioritize};
use tourgen::progress::ProgressMode;
use tourgen::scheduler::steps_per_chunk;
use tourgen::snapshot;
use tourgen::tour::{self, TourOptions};

/// tourgen: narrative code tours generated by a language model.
///
/// Settings are read from a TOML file (`--config`); built-in defaults
/// apply when it does not exist. The API key comes from `OPENAI_API_KEY`.
#[derive(Parser)]
#[command(name = "tourgen", version, about = "Generate narrative code tours with a language model")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tourgen.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a tour.
    ///
    /// Flattens the repository, asks the model for an overview and for
    /// checkpoints chunk by chunk, validates the result, and writes a
    /// `.tour` file.
    Generate {
        /// Repository root to scan.
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Read a JSON snapshot instead of scanning ROOT.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Tour title. Defaults to a timestamped title.
        #[arg(long)]
        title: Option<String>,

        /// Tour description.
        #[arg(long)]
        description: Option<String>,

        /// Area to emphasise; may be repeated.
        #[arg(long = "focus")]
        focus_areas: Vec<String>,

        /// Maximum number of steps, welcome included.
        #[arg(long)]
        max_steps: Option<usize>,

        /// Directory for the tour file. Defaults to `tour.output_dir` under ROOT.
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Progress output on stderr. Defaults to human when stderr is a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,

        /// Print the tour JSON to stdout instead of writing a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Show how files would be ranked and chunked. No model calls.
    Plan {
        /// Repository root to scan.
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Read a JSON snapshot instead of scanning ROOT.
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Print a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tourgen=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "tourgen", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing();
    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Generate {
            root,
            snapshot,
            title,
            description,
            focus_areas,
            max_steps,
            out_dir,
            progress,
            stdout,
        } => {
            let options = TourOptions {
                project_name: project_name(&root),
                title,
                description,
                focus_areas,
                max_steps,
            };
            let out_dir = out_dir.unwrap_or_else(|| root.join(&cfg.tour.output_dir));
            let progress = progress.unwrap_or_else(ProgressMode::default_for_tty);
            run_generate(cfg, &root, snapshot.as_deref(), options, &out_dir, progress, stdout)
                .await?;
        }
        Commands::Plan { root, snapshot } => {
            let snap = load_snapshot(&cfg, &root, snapshot.as_deref())?;
            print_plan(&cfg, &snap);
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

async fn run_generate(
    cfg: Config,
    root: &Path,
    snapshot_path: Option<&Path>,
    options: TourOptions,
    out_dir: &Path,
    progress: ProgressMode,
    stdout: bool,
) -> Result<()> {
    let snap = load_snapshot(&cfg, root, snapshot_path)?;
    let service = completion::create_service(&cfg.completion)?;
    let pipeline = TourPipeline::new(cfg, service);

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let reporter = progress.reporter();
    let result = pipeline
        .generate_tour(&snap, &options, reporter.as_ref(), &cancel)
        .await;

    let tour = match result {
        Ok(tour) => tour,
        Err(e) if e.is_cancelled() => {
            eprintln!("Tour generation cancelled.");
            std::process::exit(130);
        }
        Err(e) => return Err(e.into()),
    };

    if stdout {
        println!("{}", serde_json::to_string_pretty(&tour)?);
    } else {
        let path = tour::write_tour(&tour, out_dir)?;
        println!("Tour created: {} ({} steps)", tour.title, tour.steps.len());
        println!("  {}", path.display());
    }
    Ok(())
}

fn load_snapshot(cfg: &Config, root: &Path, snapshot_path: Option<&Path>) -> Result<RepositorySnapshot> {
    match snapshot_path {
        Some(path) => snapshot::load_snapshot_file(path),
        None => snapshot::scan_directory(root, &cfg.snapshot),
    }
}

fn project_name(root: &Path) -> Option<String> {
    let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    root.file_name().map(|n| n.to_string_lossy().to_string())
}

fn print_plan(cfg: &Config, snap: &RepositorySnapshot) {
    let generation = &cfg.generation;
    let ranked = prioritize(snap.files());
    let chunks = partition(&ranked, generation.files_per_chunk);

    println!("plan");
    println!("  files: {}", snap.total_files());
    println!("  lines: {}", snap.total_lines());
    println!("  languages: {}", snap.languages().join(", "));
    println!(
        "  chunks: {} ({} files each, {} in parallel)",
        chunks.len(),
        generation.files_per_chunk,
        generation.parallel_chunks
    );
    println!(
        "  steps per chunk: {}",
        steps_per_chunk(generation.target_steps, chunks.len())
    );

    for chunk in &chunks {
        println!();
        println!("chunk {}", chunk.number());
        for file in &chunk.files {
            println!("  [{}] {}", priority::rank(&file.path).as_u8(), file.path);
        }
    }

    println!();
    println!("overview key files");
    for file in overview::select_key_files(snap, &cfg.overview) {
        println!("  {}", file.path);
    }
}
