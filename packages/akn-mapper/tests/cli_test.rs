//! Tests for the `akn-mapper` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("leos")
        .join(name)
}

fn mapper() -> Command {
    Command::cargo_bin("akn-mapper").expect("bin")
}

#[test]
fn test_transform_to_stdout() {
    let expected = fs::read_to_string(fixture_path("body.html")).unwrap();

    mapper()
        .arg("transform")
        .arg("--profile")
        .arg(fixture_path("profile.yaml"))
        .args(["--direction", "to"])
        .arg(fixture_path("body.xml"))
        .assert()
        .success()
        .stdout(predicate::eq(expected));
}

#[test]
fn test_transform_from_writes_output_dir() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out");

    mapper()
        .arg("transform")
        .arg("--profile")
        .arg(fixture_path("profile.yaml"))
        .args(["--direction", "from", "--output"])
        .arg(&output)
        .arg(fixture_path("body.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved to:"));

    let written = fs::read_to_string(output.join("body.xml")).unwrap();
    assert!(written.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(written.contains(r#"<recital xml:id="rec_1"><num>(1)</num>"#));
    assert!(written.contains("<content><mp>nested</mp></content>"));
}

#[test]
fn test_transform_unknown_element_fails() {
    mapper()
        .arg("transform")
        .arg("--profile")
        .arg(fixture_path("profile.yaml"))
        .args(["--direction", "to"])
        .arg(fixture_path("unknown.xml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No rule for element <foo> in body"));
}

#[test]
fn test_transform_unmatched_flag_overrides_profile() {
    mapper()
        .arg("transform")
        .arg("--profile")
        .arg(fixture_path("profile.yaml"))
        .args(["--direction", "to", "--unmatched", "unwrap"])
        .arg(fixture_path("unknown.xml"))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"<div data-akn-name="body" id="body">bar</div>"#));
}

#[test]
fn test_transform_unknown_plugin() {
    mapper()
        .arg("transform")
        .arg("--profile")
        .arg(fixture_path("profile.yaml"))
        .args(["--direction", "to", "--plugins", "aknBody,missing"])
        .arg(fixture_path("unknown.xml"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown plugin 'missing'"));
}

#[test]
fn test_transform_depth_exceeded() {
    mapper()
        .arg("transform")
        .arg("--profile")
        .arg(fixture_path("deep-list.json"))
        .args(["--direction", "to"])
        .arg(fixture_path("deep-list.xml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds maximum depth 2"));
}

#[test]
fn test_check_reports_hierarchy() {
    mapper()
        .arg("check")
        .arg("--profile")
        .arg(fixture_path("deep-list.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Hierarchy"))
        .stdout(predicate::str::contains("list list -> li ol"))
        .stdout(predicate::str::contains("Profile is valid"));
}

#[test]
fn test_check_reports_overrides() {
    let dir = tempdir().unwrap();
    let profile = dir.path().join("editor.yaml");
    fs::write(
        &profile,
        "plugins:\n  - id: plainBold\n    rules:\n      akn: b\n      html: b\n",
    )
    .unwrap();

    mapper()
        .arg("check")
        .arg("--profile")
        .arg(&profile)
        .assert()
        .success()
        .stdout(predicate::str::contains("'plainBold' overrides 'aknInlines'"));
}

#[test]
fn test_check_rejects_malformed_profile() {
    let dir = tempdir().unwrap();
    let profile = dir.path().join("editor.yaml");
    fs::write(&profile, "plugins:\n  - id: broken\n    rules:\n      html: p\n").unwrap();

    mapper()
        .arg("check")
        .arg("--profile")
        .arg(&profile)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("plugin 'broken'"));
}

#[test]
fn test_transform_keeps_space_between_inlines() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("recital.xml");
    fs::write(
        &input,
        "<recital xml:id=\"rec_1\">\n  <mp><b>Having</b> <i>regard</i></mp>\n</recital>\n",
    )
    .unwrap();

    mapper()
        .arg("transform")
        .arg("--profile")
        .arg(fixture_path("profile.yaml"))
        .args(["--direction", "to"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "<p><strong>Having</strong> <em>regard</em></p>",
        ));
}
