use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn ragdex_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push(format!("ragdex{}", std::env::consts::EXE_SUFFIX));
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(files_dir.join("notes")).unwrap();
    fs::write(
        files_dir.join("alpha.md"),
        "# Alpha Document\n\nThis is the alpha document about Rust programming.\n\nIt contains information about cargo and crates.",
    )
    .unwrap();
    fs::write(
        files_dir.join("beta.md"),
        "# Beta Document\n\nThis document discusses Python and machine learning.\n\nDeep learning frameworks like PyTorch are covered.",
    )
    .unwrap();
    fs::write(
        files_dir.join("notes").join("gamma.txt"),
        "Gamma plain text file.\n\nContains notes about deployment and infrastructure.\n\nKubernetes and Docker are mentioned here.",
    )
    .unwrap();
    fs::write(files_dir.join("logo.png"), [0u8, 159, 146, 150]).unwrap();

    let config_content = format!(
        r#"[index]
path = "{root}/data/index.json"

[corpus]
root = "{root}/files"

[chunking]
max_chars = 800

[retrieval]
top_k = 5

[embedding]
provider = "hashing"
dims = 256
"#,
        root = root.display()
    );

    let config_path = config_dir.join("ragdex.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_ragdex(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = ragdex_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RAGDEX_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run ragdex binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn retrieve_json(config_path: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["retrieve"];
    full.extend_from_slice(args);
    full.push("--json");
    let (stdout, stderr, success) = run_ragdex(config_path, &full);
    assert!(success, "retrieve failed: stdout={}, stderr={}", stdout, stderr);
    serde_json::from_str(&stdout).unwrap()
}

#[test]
fn test_reindex_reports_summary() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_ragdex(&config_path, &["reindex"]);
    assert!(success, "reindex failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("documents: 3"), "got: {}", stdout);
    assert!(stdout.contains("chunks: 3"), "got: {}", stdout);
    assert!(stdout.contains("dims: 256"), "got: {}", stdout);
    assert!(tmp.path().join("data").join("index.json").exists());
}

#[test]
fn test_reindex_twice_is_stable() {
    let (tmp, config_path) = setup_test_env();
    let artifact = tmp.path().join("data").join("index.json");

    run_ragdex(&config_path, &["reindex"]);
    let first: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&artifact).unwrap()).unwrap();

    let (_, _, success) = run_ragdex(&config_path, &["reindex"]);
    assert!(success, "second reindex failed");
    let second: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&artifact).unwrap()).unwrap();

    assert_eq!(first["chunks"], second["chunks"]);
    assert_eq!(second["doc_count"], 3);
}

#[test]
fn test_retrieve_before_reindex() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_ragdex(&config_path, &["retrieve", "anything"]);
    assert!(success, "retrieve on a missing index should not fail");
    assert!(stdout.contains("No index yet"), "got: {}", stdout);

    let json = retrieve_json(&config_path, &["anything"]);
    assert_eq!(json["status"], "not_indexed");
    assert_eq!(json["chunks"].as_array().unwrap().len(), 0);
}

#[test]
fn test_retrieve_ranks_matching_document_first() {
    let (_tmp, config_path) = setup_test_env();
    run_ragdex(&config_path, &["reindex"]);

    let json = retrieve_json(&config_path, &["rust cargo crates"]);
    assert_eq!(json["status"], "matched");
    let chunks = json["chunks"].as_array().unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0]["doc"], "alpha.md");
    assert_eq!(chunks[0]["chunk_index"], 0);
}

#[test]
fn test_retrieve_text_output() {
    let (_tmp, config_path) = setup_test_env();
    run_ragdex(&config_path, &["reindex"]);

    let (stdout, _, success) = run_ragdex(&config_path, &["retrieve", "kubernetes docker"]);
    assert!(success);
    assert!(stdout.starts_with("1. ["), "got: {}", stdout);
    assert!(stdout.contains("notes/gamma.txt#0"), "got: {}", stdout);
    assert!(stdout.contains("excerpt:"));
}

#[test]
fn test_retrieve_top_k_and_threshold() {
    let (_tmp, config_path) = setup_test_env();
    run_ragdex(&config_path, &["reindex"]);

    let one = retrieve_json(&config_path, &["document", "--top-k", "1"]);
    assert_eq!(one["chunks"].as_array().unwrap().len(), 1);

    let none = retrieve_json(&config_path, &["document", "--threshold", "1.0"]);
    assert_eq!(none["status"], "no_matches");
    assert_eq!(none["chunks"].as_array().unwrap().len(), 0);
}

#[test]
fn test_retrieve_deterministic() {
    let (_tmp, config_path) = setup_test_env();
    run_ragdex(&config_path, &["reindex"]);

    let (stdout1, _, _) = run_ragdex(&config_path, &["retrieve", "document", "--json"]);
    let (stdout2, _, _) = run_ragdex(&config_path, &["retrieve", "document", "--json"]);
    assert_eq!(stdout1, stdout2);
}

#[test]
fn test_retrieve_empty_question_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_ragdex(&config_path, &["reindex"]);

    let (_, stderr, success) = run_ragdex(&config_path, &["retrieve", "  "]);
    assert!(!success);
    assert!(stderr.contains("invalid request"), "got: {}", stderr);
}

#[test]
fn test_empty_corpus_reports_empty_corpus() {
    let (tmp, config_path) = setup_test_env();
    let files = tmp.path().join("files");
    fs::remove_dir_all(&files).unwrap();
    fs::create_dir_all(&files).unwrap();

    let (stdout, _, success) = run_ragdex(&config_path, &["reindex"]);
    assert!(success);
    assert!(stdout.contains("chunks: 0"), "got: {}", stdout);

    let json = retrieve_json(&config_path, &["anything"]);
    assert_eq!(json["status"], "empty_corpus");
}

#[test]
fn test_ask_retrieve_only_needs_no_chat() {
    let (_tmp, config_path) = setup_test_env();
    run_ragdex(&config_path, &["reindex"]);

    let (stdout, stderr, success) = run_ragdex(
        &config_path,
        &["ask", "python learning", "--mode", "retrieve-only", "--json"],
    );
    assert!(success, "ask failed: stderr={}", stderr);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["mode"], "retrieve_only");
    assert_eq!(json["chunks"][0]["doc"], "beta.md");
    assert!(json.get("answer").is_none());
}

#[test]
fn test_ask_with_chat_disabled_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_ragdex(&config_path, &["reindex"]);

    let (_, stderr, success) = run_ragdex(&config_path, &["ask", "what is rust?"]);
    assert!(!success);
    assert!(stderr.contains("chat provider is disabled"), "got: {}", stderr);
}

#[test]
fn test_ask_rejects_unknown_mode() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_ragdex(&config_path, &["ask", "q", "--mode", "fancy"]);
    assert!(!success);
    assert!(stderr.contains("unknown mode"), "got: {}", stderr);
}

#[test]
fn test_stats_tracks_staleness() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_ragdex(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Built:       never"), "got: {}", stdout);

    run_ragdex(&config_path, &["reindex"]);
    let (stdout, _, _) = run_ragdex(&config_path, &["stats"]);
    assert!(stdout.contains("Documents:   3"), "got: {}", stdout);
    assert!(stdout.contains("Chunks:      3"), "got: {}", stdout);
    assert!(stdout.contains("Stale:       no"), "got: {}", stdout);

    fs::write(tmp.path().join("files").join("beta.md"), "Rewritten.").unwrap();
    let (stdout, _, _) = run_ragdex(&config_path, &["stats"]);
    assert!(stdout.contains("Stale:       yes"), "got: {}", stdout);
}

#[test]
fn test_malformed_index_is_reported() {
    let (tmp, config_path) = setup_test_env();
    let data = tmp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("index.json"), "{ truncated").unwrap();

    let (_, stderr, success) = run_ragdex(&config_path, &["retrieve", "rust"]);
    assert!(!success);
    assert!(stderr.contains("malformed index artifact"), "got: {}", stderr);
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_ragdex(&tmp.path().join("nope.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"), "got: {}", stderr);
}

#[test]
fn test_disabled_embedding_cannot_reindex() {
    let (_tmp, config_path) = setup_test_env();
    let content = fs::read_to_string(&config_path)
        .unwrap()
        .replace("provider = \"hashing\"", "provider = \"disabled\"");
    fs::write(&config_path, content).unwrap();

    let (_, stderr, success) = run_ragdex(&config_path, &["reindex"]);
    assert!(!success);
    assert!(stderr.contains("embedding provider is disabled"), "got: {}", stderr);
}
