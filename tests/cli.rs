//! Command-line surface tests.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ghostforge() -> Command {
    let mut cmd = Command::cargo_bin("ghostforge").unwrap();
    cmd.env_remove("GHOSTFORGE_API_KEY").env("RUST_LOG", "off");
    cmd
}

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("ghostforge.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn no_arguments_prints_usage() {
    ghostforge()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_ingestion_commands() {
    ghostforge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("movie"))
        .stdout(predicate::str::contains("series"))
        .stdout(predicate::str::contains("collection"));
}

#[test]
fn version_reports_package_version() {
    ghostforge()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    ghostforge().arg("--version").assert().success();
}

#[test]
fn validate_accepts_good_config() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        &format!(
            "[paths]\ndatabase = \"{}\"\n\n[metadata]\napi_key = \"abc\"\n\n[ingest]\nworkers = 3\n",
            dir.path().join("ghost.db").display()
        ),
    );

    ghostforge()
        .args(["validate", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Workers: 3"))
        .stdout(predicate::str::contains("API key: configured"));
}

#[test]
fn validate_rejects_zero_workers() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "[ingest]\nworkers = 0\n");

    ghostforge()
        .args(["validate", "--config"])
        .arg(&config)
        .assert()
        .failure();
}

#[test]
fn show_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        &format!(
            "[paths]\ndatabase = \"{}\"\n",
            dir.path().join("ghost.db").display()
        ),
    );

    ghostforge()
        .args(["show", "deadbeef", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No collection or media with ID deadbeef"));
}

#[test]
fn collection_requires_a_movie() {
    ghostforge()
        .args(["collection", "/media/mann", "--title", "Mann"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--movie"));
}

#[test]
fn malformed_movie_pair_is_rejected() {
    ghostforge()
        .args(["collection", "/media/mann", "--title", "Mann", "--movie", "heat.mkv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("FILE=URL"));
}
