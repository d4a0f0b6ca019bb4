//! Binary-level checks for `syncat` and `syncat-agent`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::MAIN_SEPARATOR_STR;
use tempfile::TempDir;

#[test]
fn test_agent_reports_separator() {
    Command::cargo_bin("syncat-agent")
        .expect("agent binary")
        .arg("sep")
        .assert()
        .success()
        .stdout(format!("{}\n", MAIN_SEPARATOR_STR));
}

#[test]
fn test_agent_scan_emits_json_listing() {
    let dir = TempDir::new().expect("create tempdir");
    fs::write(dir.path().join("a.jpg"), b"alpha").expect("write file");
    fs::write(dir.path().join("b.tmp"), b"temp").expect("write file");
    fs::write(dir.path().join("c.md"), b"notes").expect("write file");

    let output = Command::cargo_bin("syncat-agent")
        .expect("agent binary")
        .arg("scan")
        .arg(format!("--dir={}", dir.path().display()))
        .arg("--accept=.jpg")
        .arg("--reject=.tmp")
        .output()
        .expect("run agent");
    assert!(output.status.success());

    let listing: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let entries = listing["files"].as_array().expect("files array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], "a.jpg");
    assert_eq!(listing["tally"]["rejected"][0][1], 1);
    assert_eq!(listing["tally"]["others"][".md"], 1);
}

#[test]
fn test_agent_hash_of_missing_file_fails() {
    let dir = TempDir::new().expect("create tempdir");
    Command::cargo_bin("syncat-agent")
        .expect("agent binary")
        .arg("hash")
        .arg(format!("--dir={}", dir.path().display()))
        .arg("--file=missing.jpg")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("syncat")
        .expect("syncat binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("dupes"));
}

#[test]
fn test_missing_source_is_rejected() {
    let dst = TempDir::new().expect("create tempdir");
    Command::cargo_bin("syncat")
        .expect("syncat binary")
        .arg("-q")
        .arg("sync")
        .arg("/definitely/not/here")
        .arg(dst.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid sync configuration"));
}

#[test]
fn test_simulated_sync_leaves_target_empty() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    fs::write(src.path().join("a.jpg"), b"alpha").expect("write file");
    let config = src.path().join("syncat.toml");
    fs::write(
        &config,
        "[extensions]\naccept = [\".jpg\"]\nreject = [\".tmp\"]\n",
    )
    .expect("write config");

    Command::cargo_bin("syncat")
        .expect("syncat binary")
        .arg("-q")
        .arg("sync")
        .arg(src.path())
        .arg(dst.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("(simulated)"));

    assert!(!dst.path().join("a.jpg").exists());
}
