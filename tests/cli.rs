//! Command-line tests

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn command() -> Command {
    Command::cargo_bin("unminify-rs").unwrap()
}

#[test]
fn test_unminify_to_stdout() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.js");
    fs::write(&input, "x = a == null ? void 0 : a.b;\n").unwrap();

    command()
        .arg("unminify")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("x = a?.b;"));
}

#[test]
fn test_unminify_to_file_with_stats() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.js");
    let output = dir.path().join("output.js");
    fs::write(&input, "x = null != y ? y : 0;\n").unwrap();

    command()
        .arg("unminify")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--stats")
        .assert()
        .success()
        .stderr(predicate::str::contains("\"nullish_coalescing\": 1"));

    assert_eq!(fs::read_to_string(&output).unwrap(), "x = y ?? 0;\n");
}

#[test]
fn test_several_inputs_into_directory() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    let first = dir.path().join("first.js");
    let second = dir.path().join("second.js");
    fs::write(&first, "x = a == null ? void 0 : a.b;\n").unwrap();
    fs::write(&second, "y = c;\n").unwrap();

    command()
        .arg("unminify")
        .arg(&first)
        .arg(&second)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(out.join("first.js")).unwrap(), "x = a?.b;\n");
    assert_eq!(fs::read_to_string(out.join("second.js")).unwrap(), "y = c;\n");
}

#[test]
fn test_check_reports_without_writing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.js");
    let source = "x = a == null ? void 0 : a.b;\n";
    fs::write(&input, source).unwrap();

    command()
        .arg("check")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"optional_chains\": 1"));

    assert_eq!(fs::read_to_string(&input).unwrap(), source);
}

#[test]
fn test_parse_error_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("broken.js");
    fs::write(&input, "x = (;\n").unwrap();

    command()
        .arg("unminify")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"));
}

#[test]
fn test_missing_input_fails() {
    command()
        .arg("unminify")
        .arg("does-not-exist.js")
        .assert()
        .failure();
}

#[test]
fn test_false_leaves_flag() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.js");
    fs::write(&input, "x = a == null ? false : a.b;\n").unwrap();

    command()
        .arg("unminify")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("x = a == null ? false : a.b;"));

    command()
        .arg("unminify")
        .arg(&input)
        .arg("--false-leaves")
        .assert()
        .success()
        .stdout(predicate::str::contains("x = a?.b;"));
}
