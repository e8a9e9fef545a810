use assert_cmd::Command;
use serde_json::Value;
use std::{fs, path::Path};

const EXECUTABLE_NAME: &str = "jhgrader";

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("config.json");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn should_fail_with_missing_config() {
    let mut cmd = Command::cargo_bin(EXECUTABLE_NAME).unwrap();

    let output = cmd
        .arg("/nonexistent/config.json")
        .assert()
        .failure()
        .get_output()
        .clone();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("/nonexistent/config.json"));
    assert!(output.stdout.is_empty());
}

#[test]
fn should_fail_with_unknown_config_field() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"{"grader_root": "/g", "submission_roots": ["/s"], "pieces": {}, "extra": true}"#,
    );

    let mut cmd = Command::cargo_bin(EXECUTABLE_NAME).unwrap();
    cmd.arg(&config).assert().failure();
}

#[test]
fn should_publish_failed_pieces_without_submission() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &format!(
            r#"{{
                "grader_root": "{}",
                "submission_roots": ["/nonexistent/submission"],
                "logging_mode": "silent",
                "pieces": {{"hw1": {{"student_files": ["Hw1.java"], "assessment_files": ["TestHw1.java"]}}}}
            }}"#,
            dir.path().display()
        ),
    );

    let mut cmd = Command::cargo_bin(EXECUTABLE_NAME).unwrap();
    let output = cmd.arg(&config).assert().failure().get_output().clone();

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["passed"], Value::Bool(false));
    assert_eq!(
        report["pieces"]["failed_pieces"]["hw1"]["reason"],
        "no submission directory found"
    );
    assert_eq!(report["test_results"], Value::Null);
    assert_eq!(
        report["steps"][0]["name"],
        Value::String("jh61b.check_files".to_string())
    );
}

#[cfg(unix)]
#[test]
fn should_grade_submission_and_write_report() {
    use std::os::unix::fs::PermissionsExt;

    let grader = tempfile::tempdir().unwrap();
    let submission = tempfile::tempdir().unwrap();
    fs::write(submission.path().join("Hw1.java"), "class Hw1 {}").unwrap();

    let harness = grader.path().join("harness.sh");
    fs::write(
        &harness,
        r#"#!/bin/sh
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "--outfile" ]; then out="$arg"; fi
  prev="$arg"
done
echo '{"tests": [{"name": "testSum", "score": 2, "max_score": 2, "status": "passed"}]}' > "$out"
"#,
    )
    .unwrap();
    let mut perms = fs::metadata(&harness).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&harness, perms).unwrap();

    let config = write_config(
        grader.path(),
        &format!(
            r#"{{
                "grader_root": "{grader}",
                "submission_roots": ["{submission}"],
                "pieces": {{"hw1": {{"student_files": ["Hw1.java"], "assessment_files": ["TestHw1.java"]}}}},
                "assessment": {{"launcher": "{launcher}", "command_timeout": 30}}
            }}"#,
            grader = grader.path().display(),
            submission = submission.path().display(),
            launcher = harness.display(),
        ),
    );
    let metadata = grader.path().join("submission_metadata.json");
    fs::write(
        &metadata,
        r#"{"users": [{"email": "ada@berkeley.edu", "name": "Ada"}]}"#,
    )
    .unwrap();
    let report_path = grader.path().join("report.json");

    let mut cmd = Command::cargo_bin(EXECUTABLE_NAME).unwrap();
    cmd.arg(&config)
        .arg("--metadata")
        .arg(&metadata)
        .arg("--output")
        .arg(&report_path)
        .assert()
        .success();

    let report: Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["passed"], Value::Bool(true));
    assert_eq!(report["test_results"]["hw1"]["score"], 2.0);
    assert_eq!(report["test_results"]["hw1"]["max_score"], 2.0);
    assert_eq!(report["test_results"]["hw1"]["tests"][0]["name"], "testSum");
}
