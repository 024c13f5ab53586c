use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn recall_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("recall");
    path
}

fn write_corpus(files_dir: &Path) {
    fs::create_dir_all(files_dir).unwrap();
    fs::write(
        files_dir.join("alpha.md"),
        "# Alpha Document\n\nThis is the alpha document about Rust programming.\n\nIt contains information about cargo and crates.",
    ).unwrap();
    fs::write(
        files_dir.join("beta.md"),
        "# Beta Document\n\nThis document discusses Python and machine learning.\n\nDeep learning frameworks like PyTorch are covered.",
    ).unwrap();
    fs::write(
        files_dir.join("gamma.txt"),
        "Gamma plain text file.\n\nContains notes about deployment and infrastructure.\n\nKubernetes and Docker are mentioned here.",
    ).unwrap();
}

fn write_config(root: &Path, extra: &str) -> PathBuf {
    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[chunking]
target_chars = 1000

[corpus]
root = "{}/files"
include_globs = ["**/*.md", "**/*.txt"]
exclude_globs = []
follow_symlinks = false

{}
"#,
        root.display(),
        extra
    );

    let config_path = config_dir.join("recall.toml");
    fs::write(&config_path, config_content).unwrap();
    config_path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    write_corpus(&root.join("files"));
    let config_path = write_config(&root, "");
    (tmp, config_path)
}

fn run_recall(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = recall_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run recall binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_search_finds_matching_document() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_recall(&config_path, &["search", "Rust programming"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    assert!(
        stdout.starts_with("1. ["),
        "Expected ranked output, got: {}",
        stdout
    );
    assert!(
        stdout.contains("alpha.md"),
        "Expected alpha.md in results, got: {}",
        stdout
    );
    assert!(!stdout.contains("beta.md"));
}

#[test]
fn test_search_deterministic() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout1, _, _) = run_recall(&config_path, &["search", "document"]);
    let (stdout2, _, _) = run_recall(&config_path, &["search", "document"]);
    assert!(!stdout1.contains("No results"));
    assert_eq!(
        stdout1, stdout2,
        "Search results should be deterministic across runs"
    );
}

#[test]
fn test_search_empty_query() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_recall(&config_path, &["search", ""]);
    assert!(success, "Empty query should not panic");
    assert!(stdout.contains("No results"));
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_recall(&config_path, &["search", "xylophone zebra quartz"]);
    assert!(success);
    assert!(stdout.contains("No results"), "got: {}", stdout);
}

#[test]
fn test_search_json() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_recall(
        &config_path,
        &["search", "machine learning frameworks", "--json"],
    );
    assert!(success, "search --json failed: {}", stderr);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = parsed.as_array().unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0]["source"], "beta.md");
    assert_eq!(results[0]["document_id"], "beta.md");
    assert!(results[0]["score"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_search_limit() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_recall(&config_path, &["search", "document", "--limit", "1", "--json"]);
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
}

#[test]
fn test_context_cites_source() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_recall(&config_path, &["context", "Kubernetes Docker"]);
    assert!(success, "context failed: {}", stderr);
    assert!(stdout.starts_with("gamma.txt: "), "got: {}", stdout);
    assert!(stdout.contains("Kubernetes and Docker are mentioned here."));
}

#[test]
fn test_context_respects_max_chars() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_recall(
        &config_path,
        &["context", "Kubernetes Docker", "--max-chars", "40"],
    );
    assert!(success);
    let context = stdout.trim_end_matches('\n');
    assert!(!context.is_empty());
    assert!(context.chars().count() <= 40, "got {:?}", context);
    assert!(context.ends_with("..."));
}

#[test]
fn test_context_no_match_reports_on_stderr() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_recall(&config_path, &["context", "xylophone zebra quartz"]);
    assert!(success);
    assert!(stdout.is_empty(), "got: {}", stdout);
    assert!(stderr.contains("No relevant context."));
}

#[test]
fn test_stats() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_recall(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Documents:   3"), "got: {}", stdout);
    assert!(stdout.contains("Passages:    3"), "got: {}", stdout);
    assert!(stdout.contains("hashing-xxh64:d512"));
}

#[test]
fn test_stats_json() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_recall(&config_path, &["stats", "--json"]);
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["document_count"], 3);
    assert_eq!(parsed["ready"], true);
    assert_eq!(parsed["enabled"], true);
    assert_eq!(parsed["dims"], 512);
    assert_eq!(parsed["cache"]["entries"], 3);
}

#[test]
fn test_documents_lists_corpus() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_recall(&config_path, &["documents"]);
    assert!(success);
    let alpha = stdout.find("alpha.md").unwrap();
    let beta = stdout.find("beta.md").unwrap();
    let gamma = stdout.find("gamma.txt").unwrap();
    assert!(alpha < beta && beta < gamma);
    assert!(stdout.contains("3 document(s)"));
}

#[test]
fn test_exclude_globs_respected() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    write_corpus(&root.join("files"));
    fs::create_dir_all(root.join("files/drafts")).unwrap();
    fs::write(root.join("files/drafts/wip.md"), "Draft notes.").unwrap();
    let config_path = write_config(&root, "");

    let (stdout, _, _) = run_recall(&config_path, &["stats", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["document_count"], 4);

    let content = fs::read_to_string(&config_path)
        .unwrap()
        .replace("exclude_globs = []", "exclude_globs = [\"drafts/**\"]");
    fs::write(&config_path, content).unwrap();

    let (stdout, _, _) = run_recall(&config_path, &["stats", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["document_count"], 3);
}

#[test]
fn test_specific_term_fallback() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    write_corpus(&root.join("files"));
    let config_path = write_config(&root, "[retrieval]\nspecific_terms = [\"gamma\"]\n");

    let (stdout, _, success) = run_recall(&config_path, &["search", "gamma", "--json"]);
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = parsed.as_array().unwrap();
    assert!(results.iter().any(|r| r["source"] == "gamma.txt"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_recall(&tmp.path().join("nope.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_invalid_config_rejected() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    write_corpus(&root.join("files"));
    let config_path = write_config(
        &root,
        "[retrieval]\nshort_query_threshold = 0.9\ndefault_threshold = 0.1\n",
    );

    let (_, stderr, success) = run_recall(&config_path, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("short_query_threshold"), "got: {}", stderr);
}

#[test]
fn test_missing_corpus_root_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), "");

    let (_, stderr, success) = run_recall(&config_path, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Corpus root does not exist"), "got: {}", stderr);
}
