//! End-to-end runs of the `tally` binary against a temp database.
//!
//! Only commands that need no upstream network are exercised here.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/tally.sqlite"

[server]
bind = "127.0.0.1:0"

[sources.dragonball]
max_id = 58
"#,
        root.display()
    );

    let config_path = config_dir.join("tally.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_tally(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_tally"))
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("TALLY_DB_PATH")
        .env_remove("SUPERHERO_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run tally binary: {}", e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_init_creates_database() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_tally(&config, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("Database initialized"));
    assert!(tmp.path().join("data/tally.sqlite").exists());

    // Idempotent.
    let (_, stderr, ok) = run_tally(&config, &["init"]);
    assert!(ok, "second init failed: {}", stderr);
}

#[test]
fn test_vote_then_list_and_top() {
    let (_tmp, config) = setup_test_env();
    run_tally(&config, &["init"]);

    for args in [
        ["vote", "pokemon", "25", "Pikachu", "like"],
        ["vote", "pokemon", "25", "Pikachu", "like"],
        ["vote", "dragonball", "1", "Goku", "dislike"],
    ] {
        let (stdout, stderr, ok) = run_tally(&config, &args);
        assert!(ok, "vote failed: {}", stderr);
        let ack: Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(ack["ok"], true);
    }

    let (stdout, stderr, ok) = run_tally(&config, &["list", "--sort-by", "likes", "--limit", "1"]);
    assert!(ok, "list failed: {}", stderr);
    let page: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"][0]["name"], "Pikachu");
    assert_eq!(page["items"][0]["likes"], 2);

    let (stdout, _, ok) = run_tally(&config, &["top", "disliked"]);
    assert!(ok);
    let top: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(top["name"], "Goku");
    assert_eq!(top["source"], "dragonball");

    let (stdout, _, ok) = run_tally(&config, &["top", "recent"]);
    assert!(ok);
    let recent: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(recent["sourceId"], "1");
}

#[test]
fn test_invalid_arguments_fail() {
    let (_tmp, config) = setup_test_env();
    run_tally(&config, &["init"]);

    let (_, _, ok) = run_tally(&config, &["vote", "digimon", "1", "Agumon", "like"]);
    assert!(!ok);

    let (_, stderr, ok) = run_tally(&config, &["list", "--limit", "500"]);
    assert!(!ok);
    assert!(stderr.contains("limit"), "stderr: {}", stderr);
}

#[test]
fn test_sources_lists_all_four() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_tally(&config, &["sources"]);
    assert!(ok, "sources failed: {}", stderr);
    for name in ["rickandmorty", "pokemon", "superhero", "dragonball"] {
        assert!(stdout.contains(name), "missing {} in:\n{}", name, stdout);
    }
    assert!(stdout.contains("misconfigured"));
}
