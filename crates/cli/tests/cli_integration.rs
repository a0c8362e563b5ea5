//! CLI integration tests for the `generate` and `check` subcommands.
//!
//! Uses `assert_cmd` to spawn the `lrgen` binary and verify exit codes,
//! stdout content, and stderr content. All tests set `current_dir` to
//! the workspace root so relative fixture paths resolve.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/cli -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

/// Helper: create a Command for the `lrgen` binary, rooted at workspace.
fn lrgen() -> Command {
    let mut cmd = cargo_bin_cmd!("lrgen");
    cmd.current_dir(workspace_root());
    cmd
}

/// Copy of the arith fixture with two nonterminals that share a
/// camel-case spelling.
fn colliding_fixture(dir: &TempDir) -> PathBuf {
    let text = fs::read_to_string(workspace_root().join("fixtures/arith.json")).unwrap();
    let text = text.replacen(
        r#""goto_row": [],"#,
        r#""goto_row": [[{"name": "expr"}, 2]],"#,
        1,
    );
    let path = dir.path().join("collide.json");
    fs::write(&path, text).unwrap();
    path
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    lrgen()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("LR parser generator backend"));
}

#[test]
fn version_exits_0() {
    lrgen()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lrgen"));
}

#[test]
fn generate_requires_target() {
    lrgen()
        .args(["generate", "fixtures/arith.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--target"));
}

// ──────────────────────────────────────────────
// 2. Generate subcommand
// ──────────────────────────────────────────────

#[test]
fn generate_python_to_stdout() {
    lrgen()
        .args(["generate", "fixtures/arith.json", "--target", "python"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("from lrgen import runtime\n"))
        .stdout(predicate::str::contains(
            "lambda builder, x0, x1, x2: builder.add(x0, x2)",
        ))
        .stdout(predicate::str::contains("class Parser(runtime.Parser):"));
}

#[test]
fn generate_rust_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("parser_tables_generated.rs");
    lrgen()
        .args(["generate", "fixtures/arith.json", "--target", "rust", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Generated rust parser"));

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("// WARNING: This file is autogenerated.\n"));
    assert!(text.contains("    PlusSign = 1, // \"+\""));
    assert!(text.contains("static ACTIONS: [i64; 15] = ["));
    assert!(text.contains("handler.add(x0, x2)"));
    assert!(text.contains("pub fn parse_expr<'alloc, I>("));
}

#[test]
fn generate_quiet_prints_nothing_on_stderr() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.py");
    lrgen()
        .args(["--quiet", "generate", "fixtures/arith.json", "--target", "python", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
    assert!(out.exists());
}

#[test]
fn generate_with_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("lrgen.toml");
    fs::write(
        &config,
        "[rust]\nhandler = \"TreeBuilder\"\nfallible_methods = [\"add\"]\n",
    )
    .unwrap();
    lrgen()
        .args(["generate", "fixtures/arith.json", "--target", "rust", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("handler: &TreeBuilder<'alloc>,"))
        .stdout(predicate::str::contains("handler.add(x0, x2)?"));
}

#[test]
fn generate_bad_config_exits_1() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("lrgen.toml");
    fs::write(&config, "[rust]\nhandler = 3\n").unwrap();
    lrgen()
        .args(["generate", "fixtures/arith.json", "--target", "rust", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error parsing config"));
}

#[test]
fn generate_missing_input_exits_1() {
    lrgen()
        .args(["generate", "fixtures/missing.json", "--target", "rust"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error reading 'fixtures/missing.json'"));
}

#[test]
fn generate_malformed_ir_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"states": "nope"}"#).unwrap();
    lrgen()
        .args(["generate", "--target", "python"])
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid IR document"));
}

#[test]
fn generate_collision_writes_no_file() {
    let dir = TempDir::new().unwrap();
    let input = colliding_fixture(&dir);
    let out = dir.path().join("parser.rs");
    lrgen()
        .args(["generate", "--target", "rust"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("same camel-case spelling (Expr)"));
    assert!(!out.exists(), "no output file on a failed generation");
}

#[test]
fn generate_collision_json_error() {
    let dir = TempDir::new().unwrap();
    let input = colliding_fixture(&dir);
    lrgen()
        .args(["--output", "json", "generate", "--target", "python"])
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::starts_with("{\"error\":"));
}

// ──────────────────────────────────────────────
// 3. Check subcommand
// ──────────────────────────────────────────────

#[test]
fn check_valid_ir() {
    lrgen()
        .args(["check", "fixtures/arith.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ok (5 states, 3 productions, 3 terminals, 1 nonterminals)",
        ));
}

#[test]
fn check_json_report() {
    let output = lrgen()
        .args(["--output", "json", "check", "fixtures/arith.json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["ok"], true);
    assert_eq!(report["states"], 5);
    assert_eq!(report["goals"], serde_json::json!(["Expr"]));
}

#[test]
fn check_reports_collision() {
    let dir = TempDir::new().unwrap();
    let input = colliding_fixture(&dir);
    lrgen()
        .arg("check")
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("python target"))
        .stderr(predicate::str::contains("Expr and expr"));
}
