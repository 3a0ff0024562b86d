use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn write(root: &std::path::Path, rel: &str, content: &str) {
  let path = root.join(rel);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

fn manifest(root: &std::path::Path) {
  write(
    root,
    "bundlr.json",
    r#"{
  "projectRoot": ".",
  "sourceRoot": "src",
  "outputFolder": "build",
  "entryPoints": ["src/main.ts"],
  "isDev": true
}"#,
  );
  write(root, "src/main.ts", "console.log(1);");
}

#[test]
fn build_writes_bundle_and_runtime_shim() {
  let tmp = TempDir::new().unwrap();
  manifest(tmp.path());

  Command::cargo_bin("bundlr")
    .unwrap()
    .args(["build", "--config", "bundlr.json"])
    .current_dir(tmp.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("Rebuilt:"));

  assert!(tmp.path().join("build/main.js").exists());
  assert!(tmp.path().join("build/require.js").exists());
}

#[test]
fn build_json_output_is_valid_json() {
  let tmp = TempDir::new().unwrap();
  manifest(tmp.path());

  let output = Command::cargo_bin("bundlr")
    .unwrap()
    .args(["build", "--config", "bundlr.json", "--json"])
    .current_dir(tmp.path())
    .output()
    .unwrap();

  assert!(output.status.success());
  let stdout = String::from_utf8_lossy(&output.stdout);
  let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid json");
  assert!(parsed.get("rebuilt").is_some());
}

#[test]
fn second_build_reports_fresh_targets() {
  let tmp = TempDir::new().unwrap();
  manifest(tmp.path());

  Command::cargo_bin("bundlr")
    .unwrap()
    .args(["build", "--config", "bundlr.json"])
    .current_dir(tmp.path())
    .assert()
    .success();

  Command::cargo_bin("bundlr")
    .unwrap()
    .args(["build", "--config", "bundlr.json"])
    .current_dir(tmp.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to rebuild"));
}

#[test]
fn clean_removes_build_output() {
  let tmp = TempDir::new().unwrap();
  manifest(tmp.path());

  Command::cargo_bin("bundlr")
    .unwrap()
    .args(["build", "--config", "bundlr.json"])
    .current_dir(tmp.path())
    .assert()
    .success();
  assert!(tmp.path().join("build").exists());

  Command::cargo_bin("bundlr")
    .unwrap()
    .args(["clean", "--config", "bundlr.json"])
    .current_dir(tmp.path())
    .assert()
    .success();
  assert!(!tmp.path().join("build").exists());
}

#[test]
fn profile_flag_prints_profiling_report() {
  let tmp = TempDir::new().unwrap();
  manifest(tmp.path());

  Command::cargo_bin("bundlr")
    .unwrap()
    .args(["build", "--config", "bundlr.json", "--profile"])
    .current_dir(tmp.path())
    .assert()
    .success()
    .stderr(predicate::str::contains("BUNDLER PROFILING REPORT"));
}

#[test]
fn missing_manifest_is_a_clean_error() {
  let tmp = TempDir::new().unwrap();

  Command::cargo_bin("bundlr")
    .unwrap()
    .args(["build", "--config", "bundlr.json"])
    .current_dir(tmp.path())
    .assert()
    .failure();
}
