//! E2E tests for `cw run` and `cw demo`.
//!
//! Each test runs the `cw` binary as a subprocess in an isolated temp
//! directory, with user configuration pointed at that directory too.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the `cw` binary, rooted in `dir`.
fn cw_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cw"));
    cmd.current_dir(dir);
    // Keep user config and output format from leaking into tests
    cmd.env("XDG_CONFIG_HOME", dir);
    cmd.env_remove("FORMAT");
    // Suppress tracing output that goes to stderr
    cmd.env("CLOCKWORK_LOG", "error");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}

/// Run `cw run <file> --json` and return the parsed timeline.
fn run_json(dir: &Path, file: &str) -> Value {
    let output = cw_cmd(dir)
        .args(["run", file, "--json"])
        .output()
        .expect("run should not crash");
    assert!(
        output.status.success(),
        "run {file} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("run --json should produce valid JSON")
}

fn event_times(timeline: &Value) -> Vec<Vec<Value>> {
    timeline["lines"]
        .as_array()
        .expect("lines array")
        .iter()
        .map(|line| {
            line["events"]
                .as_array()
                .expect("events array")
                .iter()
                .map(|e| e["time"].clone())
                .collect()
        })
        .collect()
}

const EXCHANGE_TOML: &str = r#"
lines = 2

[[ops]]
op = "add_event"
line = 0
name = "send"

[[ops]]
op = "add_event"
line = 1
name = "local"

[[ops]]
op = "add_event"
line = 1
name = "recv"

[[ops]]
op = "add_relation"
from = "send"
to = "recv"
"#;

// ---------------------------------------------------------------------------
// cw run
// ---------------------------------------------------------------------------

#[test]
fn run_toml_scenario_renders_lamport_timeline() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "exchange.toml", EXCHANGE_TOML);

    let timeline = run_json(dir.path(), "exchange.toml");
    assert_eq!(timeline["strategy"], "scalar");
    assert_eq!(
        event_times(&timeline),
        vec![vec![json!(1)], vec![json!(1), json!(2)]]
    );
    assert_eq!(timeline["lines"][1]["events"][1]["caused_by"], "send");
    assert_eq!(
        timeline["relations"],
        json!([{"from": "send", "to": "recv"}])
    );
}

#[test]
fn strategy_flag_overrides_scenario_header() {
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        "exchange.toml",
        &format!("strategy = \"scalar\"\n{EXCHANGE_TOML}"),
    );

    let output = cw_cmd(dir.path())
        .args(["run", "exchange.toml", "--strategy", "vector", "--json"])
        .output()
        .expect("run should not crash");
    assert!(output.status.success());
    let timeline: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(timeline["strategy"], "vector");
    assert_eq!(
        event_times(&timeline),
        vec![vec![json!([1, 0])], vec![json!([0, 1]), json!([1, 2])]]
    );
}

#[test]
fn project_config_selects_strategy_for_scripts() {
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        ".clockwork/config.toml",
        "[clock]\nstrategy = \"vector\"\nlines = 2\n",
    );
    write(
        dir.path(),
        "exchange.cw",
        "# vector exchange\nevent 0 a\nevent 1 b\nrelate a b\n",
    );

    let timeline = run_json(dir.path(), "exchange.cw");
    assert_eq!(timeline["strategy"], "vector");
    assert_eq!(timeline["lines"].as_array().map(Vec::len), Some(2));
    assert_eq!(timeline["lines"][1]["events"][0]["time"], json!([1, 1]));
}

#[test]
fn text_output_lists_one_row_per_event() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "exchange.toml", EXCHANGE_TOML);

    cw_cmd(dir.path())
        .args(["run", "exchange.toml", "--format", "text"])
        .assert()
        .success()
        .stdout(
            "line  pos  name  time  cause\n\
             0  1  send  1  -\n\
             1  1  local  1  -\n\
             1  2  recv  2  send\n",
        );
}

#[test]
fn failing_step_reports_step_number_and_code() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "broken.cw", "event 0 a\nrelate a ghost\nevent 1 b\n");

    cw_cmd(dir.path())
        .args(["run", "broken.cw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2003]: step 2: unknown event: ghost"));
}

#[test]
fn inconsistent_relation_fails_with_json_error() {
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        "cycle.cw",
        "event 0 a1\nevent 0 a2\nevent 1 b1\nevent 1 b2\nrelate a2 b1\nrelate b2 a1\n",
    );

    let output = cw_cmd(dir.path())
        .args(["run", "cycle.cw", "--lines", "2", "--json"])
        .output()
        .expect("run should not crash");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    // The rendered error comes first; anyhow's summary follows it.
    let err: Value = serde_json::Deserializer::from_slice(&output.stderr)
        .into_iter::<Value>()
        .next()
        .expect("stderr is not empty")
        .expect("error JSON on stderr");
    assert_eq!(err["error"]["error_code"], "E3001");
    assert!(err["error"]["message"]
        .as_str()
        .is_some_and(|m| m.starts_with("step 6:")));
}

#[test]
fn parse_error_names_the_source_line() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "typo.cw", "event 0 a\n\nrelat a b\n");

    cw_cmd(dir.path())
        .args(["run", "typo.cw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E4001]: line 3: unknown command 'relat'"));
}

#[test]
fn missing_file_fails_with_context() {
    let dir = TempDir::new().expect("temp dir");
    cw_cmd(dir.path())
        .args(["run", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read nope.toml"));
}

#[test]
fn format_env_selects_json() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "exchange.toml", EXCHANGE_TOML);

    let output = cw_cmd(dir.path())
        .env("FORMAT", "json")
        .args(["run", "exchange.toml"])
        .output()
        .expect("run should not crash");
    assert!(output.status.success());
    let timeline: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(timeline["strategy"], "scalar");
}

#[test]
fn user_config_output_applies_when_nothing_else_is_set() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "clockwork/config.toml", "output = \"json\"\n");
    write(dir.path(), "exchange.toml", EXCHANGE_TOML);

    let output = cw_cmd(dir.path())
        .args(["run", "exchange.toml"])
        .output()
        .expect("run should not crash");
    assert!(output.status.success());
    serde_json::from_slice::<Value>(&output.stdout).expect("user config selects JSON");
}

// ---------------------------------------------------------------------------
// cw demo
// ---------------------------------------------------------------------------

#[test]
fn demo_json_shows_relation_raising_and_restoring_b() {
    let dir = TempDir::new().expect("temp dir");
    let output = cw_cmd(dir.path())
        .args(["demo", "--json"])
        .output()
        .expect("demo should not crash");
    assert!(output.status.success());

    let steps: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let steps = steps.as_array().expect("steps array");
    assert_eq!(steps.len(), 4);
    let b_time = |i: usize| steps[i]["timeline"]["lines"][1]["events"][0]["time"].clone();
    assert_eq!(b_time(1), json!(1));
    assert_eq!(b_time(2), json!(2));
    assert_eq!(b_time(3), json!(1));
    assert_eq!(steps[3]["op"], "unrelate a b");
}

#[test]
fn demo_text_labels_each_step() {
    let dir = TempDir::new().expect("temp dir");
    cw_cmd(dir.path())
        .args(["demo", "--format", "text", "--strategy", "vector"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "# step 3: relate a b\n0  1  a  [1, 0]  -\n1  1  b  [1, 1]  a\n",
        ));
}

// ---------------------------------------------------------------------------
// cw completions
// ---------------------------------------------------------------------------

#[test]
fn completions_emit_a_script() {
    let dir = TempDir::new().expect("temp dir");
    cw_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cw"));
}
