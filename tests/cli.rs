use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn tourgen_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tourgen"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let repo = root.join("repo");
    fs::create_dir_all(repo.join("src")).unwrap();
    fs::write(repo.join("README.md"), "# Demo\n\nA small demo service.\n").unwrap();
    fs::write(
        repo.join("src/main.rs"),
        "mod server;\n\nfn main() {\n    server::run();\n}\n",
    )
    .unwrap();
    fs::write(repo.join("src/server.rs"), "pub fn run() {}\n").unwrap();
    fs::write(repo.join("Cargo.toml"), "[package]\nname = \"demo\"\n").unwrap();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("tourgen.toml");
    fs::write(
        &config_path,
        r#"[generation]
files_per_chunk = 2
parallel_chunks = 2
batch_delay_ms = 0

[completion]
provider = "disabled"
"#,
    )
    .unwrap();

    (tmp, config_path)
}

fn run_tourgen(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = tourgen_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env("RUST_LOG", "tourgen=warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run tourgen binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_plan_ranks_entry_point_first() {
    let (tmp, config) = setup_test_env();
    let repo = tmp.path().join("repo");

    let (stdout, stderr, success) = run_tourgen(&config, &["plan", repo.to_str().unwrap()]);
    assert!(success, "plan failed: {}", stderr);

    assert!(stdout.contains("files: 4"), "stdout: {}", stdout);
    assert!(stdout.contains("chunks: 2"), "stdout: {}", stdout);

    let chunk_one = stdout.find("chunk 1").unwrap();
    let main_rs = stdout.find("[1] src/main.rs").unwrap();
    let server_rs = stdout.find("src/server.rs").unwrap();
    assert!(chunk_one < main_rs && main_rs < server_rs);
    assert!(stdout.contains("overview key files"));
}

#[test]
fn test_plan_from_json_snapshot() {
    let (tmp, config) = setup_test_env();
    let snapshot = tmp.path().join("snapshot.json");
    fs::write(
        &snapshot,
        r#"{"files": [
            {"path": "lib/util.py", "content": "def f():\n    pass\n"},
            {"path": "main.py", "content": "import lib.util\n"}
        ]}"#,
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_tourgen(&config, &["plan", "--snapshot", snapshot.to_str().unwrap()]);
    assert!(success, "plan failed: {}", stderr);
    assert!(stdout.contains("languages: python"), "stdout: {}", stdout);
    assert!(stdout.find("main.py").unwrap() < stdout.find("lib/util.py").unwrap());
}

#[test]
fn test_generate_without_model_fails_naming_chunks() {
    let (tmp, config) = setup_test_env();
    let repo = tmp.path().join("repo");

    let (_stdout, stderr, success) = run_tourgen(
        &config,
        &["generate", repo.to_str().unwrap(), "--progress", "off"],
    );
    assert!(!success);
    assert!(stderr.contains("all 2 chunks failed"), "stderr: {}", stderr);
    assert!(!repo.join(".tours").exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let (tmp, _) = setup_test_env();
    let config = tmp.path().join("bad.toml");
    fs::write(&config, "[generation]\nfiles_per_chunk = 0\n").unwrap();

    let (_stdout, stderr, success) = run_tourgen(&config, &["plan", "."]);
    assert!(!success);
    assert!(stderr.contains("files_per_chunk"), "stderr: {}", stderr);
}

#[test]
fn test_completions_print_script() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _stderr, success) = run_tourgen(&config, &["completions", "bash"]);
    assert!(success);
    assert!(stdout.contains("tourgen"));
}
