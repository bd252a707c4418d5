//! CLI integration tests
//!
//! These run the built binary against a temporary datastore.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const SONE_DEFINITION: &str = r#"{
    "id": "cli-sone",
    "name": "clara",
    "request_uri": "USK@clara-public,key,AQACAAE/Sone/0",
    "insert_uri": "SSK@clara-private,key,AQECAAE/",
    "posts": [{ "id": "p1", "time": 1000, "text": "posted from the command line" }]
}"#;

fn write_sone(dir: &Path) -> PathBuf {
    let path = dir.join("clara.json");
    fs::write(&path, SONE_DEFINITION).unwrap();
    path
}

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sone-cli"))
        .current_dir(dir)
        .env_remove("SONE_INSERTER__INSERTION_DELAY_SECS")
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

/// Path of the `sone.json` entry below a final URI printed by the CLI
fn sone_json_path(store: &Path, final_uri: &str) -> PathBuf {
    let rest = final_uri.trim().strip_prefix("USK@").unwrap();
    let mut parts = rest.split('/');
    let digest = parts.next().unwrap();
    let doc = parts.next().unwrap();
    let edition = parts.next().unwrap();
    store
        .join(&digest[..2])
        .join(digest)
        .join(doc)
        .join(edition)
        .join("sone.json")
}

#[test]
fn test_insert_prints_final_uri_and_writes_store() {
    let temp_dir = TempDir::new().unwrap();
    let sone = write_sone(temp_dir.path());
    let store = temp_dir.path().join("store");

    let output = run_cli(
        temp_dir.path(),
        &[
            "insert",
            "--sone",
            sone.to_str().unwrap(),
            "--store",
            store.to_str().unwrap(),
        ],
    );

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.trim().starts_with("USK@"));
    assert!(stdout.trim().ends_with("/Sone-clara/0"));
    assert!(!stdout.contains("clara-private"));

    let published: serde_json::Value =
        serde_json::from_slice(&fs::read(sone_json_path(&store, &stdout)).unwrap()).unwrap();
    assert_eq!(published["id"], "cli-sone");
    assert_eq!(published["posts"][0]["text"], "posted from the command line");
}

#[test]
fn test_second_insert_uses_next_edition() {
    let temp_dir = TempDir::new().unwrap();
    let sone = write_sone(temp_dir.path());
    let store = temp_dir.path().join("store");
    let args = [
        "insert",
        "--sone",
        sone.to_str().unwrap(),
        "--store",
        store.to_str().unwrap(),
    ];

    run_cli(temp_dir.path(), &args);
    let output = run_cli(temp_dir.path(), &args);

    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)
        .unwrap()
        .trim()
        .ends_with("/Sone-clara/1"));
}

#[test]
fn test_store_root_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let sone = write_sone(temp_dir.path());
    let config = temp_dir.path().join("sone.toml");
    fs::write(&config, "[store]\nroot = \"configured-store\"\n").unwrap();

    let output = run_cli(
        temp_dir.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "insert",
            "--sone",
            sone.to_str().unwrap(),
        ],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(sone_json_path(&temp_dir.path().join("configured-store"), &stdout).is_file());
}

#[test]
fn test_watch_publishes_then_stops() {
    let temp_dir = TempDir::new().unwrap();
    let sone = write_sone(temp_dir.path());
    let store = temp_dir.path().join("store");

    let output = run_cli(
        temp_dir.path(),
        &[
            "watch",
            "--sone",
            sone.to_str().unwrap(),
            "--store",
            store.to_str().unwrap(),
            "--duration-secs",
            "1",
            "--insertion-delay-secs",
            "5",
        ],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("inserted cli-sone at USK@"));
    assert!(stdout.contains("stopped watching cli-sone"));
}

#[test]
fn test_missing_sone_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_cli(temp_dir.path(), &["insert", "--sone", "missing.json"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error: "));
}

#[test]
fn test_malformed_sone_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let sone = temp_dir.path().join("broken.json");
    fs::write(&sone, "{ not json").unwrap();

    let output = run_cli(
        temp_dir.path(),
        &["insert", "--sone", sone.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(1));
}
