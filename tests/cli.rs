use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::Stdio;
use tempfile::tempdir;

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    let s = String::from_utf8_lossy(stdout);
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<Value>(l).expect("valid jsonl line"))
        .collect()
}

fn filecache(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("filecache"));
    cmd.arg("--dir").arg(dir);
    cmd
}

fn run_jsonl(dir: &Path, args: &[&str]) -> Vec<Value> {
    let assert = filecache(dir).args(args).assert().success();
    parse_jsonl(&assert.get_output().stdout)
}

#[test]
fn set_then_get_round_trips_json() {
    let temp = tempdir().unwrap();

    let items = run_jsonl(temp.path(), &["set", "numbers", "[1,2,3]"]);
    assert_eq!(items[0]["ok"], true);
    assert_eq!(items[0]["expires"], "never");
    assert!(temp.path().join("cache-numbers.cache").exists());

    let items = run_jsonl(temp.path(), &["get", "numbers"]);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["key"], "numbers");
    assert_eq!(items[0]["value"], serde_json::json!([1, 2, 3]));
}

#[test]
fn plain_values_are_stored_as_strings() {
    let temp = tempdir().unwrap();

    run_jsonl(temp.path(), &["set", "greeting", "hello world"]);
    let items = run_jsonl(temp.path(), &["get", "greeting"]);
    assert_eq!(items[0]["value"], "hello world");
}

#[test]
fn get_missing_prints_default() {
    let temp = tempdir().unwrap();

    let items = run_jsonl(temp.path(), &["get", "nothing"]);
    assert_eq!(items[0]["value"], Value::Null);

    let items = run_jsonl(temp.path(), &["get", "nothing", "--default", "fallback"]);
    assert_eq!(items[0]["value"], "fallback");
}

#[test]
fn expired_entry_falls_back_to_default() {
    let temp = tempdir().unwrap();

    run_jsonl(temp.path(), &["set", "short", "1", "--ttl", "1"]);
    std::thread::sleep(std::time::Duration::from_millis(2100));

    let items = run_jsonl(temp.path(), &["get", "short", "--default", "0"]);
    assert_eq!(items[0]["value"], 0);
    assert!(!temp.path().join("cache-short.cache").exists());
}

#[test]
fn delete_has_and_clear() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("unrelated.txt"), "keep").unwrap();

    for key in ["a", "b", "c"] {
        run_jsonl(temp.path(), &["set", key, "1"]);
    }

    let items = run_jsonl(temp.path(), &["delete", "a"]);
    assert_eq!(items[0]["ok"], true);

    let items = run_jsonl(temp.path(), &["has", "a"]);
    assert_eq!(items[0]["ok"], false);
    let items = run_jsonl(temp.path(), &["has", "b"]);
    assert_eq!(items[0]["ok"], true);

    let items = run_jsonl(temp.path(), &["clear"]);
    assert_eq!(items[0]["ok"], true);
    assert_eq!(items[0]["count"], 2);

    assert!(run_jsonl(temp.path(), &["list"]).is_empty());
    assert!(temp.path().join("unrelated.txt").exists());
}

#[test]
fn list_reports_expiration() {
    let temp = tempdir().unwrap();

    run_jsonl(temp.path(), &["set", "forever", "1"]);
    run_jsonl(temp.path(), &["set", "later", "1", "--ttl", "3600"]);

    let items = run_jsonl(temp.path(), &["list"]);
    let keys: Vec<_> = items.iter().map(|v| v["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["forever", "later"]);

    assert_eq!(items[0]["expires"], "never");
    assert_eq!(items[0]["expired"], false);
    assert_ne!(items[1]["expires"], "never");
    assert_eq!(items[1]["expired"], false);
}

#[test]
fn invalid_key_fails() {
    let temp = tempdir().unwrap();

    filecache(temp.path())
        .args(["get", "a/b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid key"));

    filecache(temp.path())
        .args(["set", "me@host", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid key"));
}

#[test]
fn negative_ttl_fails() {
    let temp = tempdir().unwrap();

    filecache(temp.path())
        .args(["set", "k", "1", "--ttl", "-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid ttl"));

    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn missing_directory_fails() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("missing");

    filecache(&missing)
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid cache directory"));

    assert!(!missing.exists());
}

#[test]
fn markdown_output() {
    let temp = tempdir().unwrap();

    filecache(temp.path())
        .args(["--format", "md", "set", "k", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- set `k`: ok"));
}

#[test]
fn lock_is_exclusive_across_processes() {
    let temp = tempdir().unwrap();

    let mut holder = std::process::Command::new(assert_cmd::cargo::cargo_bin!("filecache"))
        .arg("--dir")
        .arg(temp.path())
        .args(["lock", "job", "--hold", "3"])
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    // wait until the holder reports the lock
    let stdout = holder.stdout.take().unwrap();
    let mut first_line = String::new();
    BufReader::new(stdout).read_line(&mut first_line).unwrap();
    let held: Value = serde_json::from_str(first_line.trim()).unwrap();
    assert_eq!(held["ok"], true);

    let items = run_jsonl(temp.path(), &["lock", "job"]);
    assert_eq!(items[0]["ok"], false);

    assert!(holder.wait().unwrap().success());

    let items = run_jsonl(temp.path(), &["lock", "job"]);
    assert_eq!(items[0]["ok"], true);
}
