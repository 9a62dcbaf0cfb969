//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `scribe` isolated from the caller's home directory, `.env` and secrets
fn scribe(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("scribe").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("SECRET_KEY")
        .env_remove("SCRIBE_PROFILE")
        .env_remove("SCRIBE_ADMIN")
        .env_remove("RUST_LOG");
    cmd
}

// === Help ===

#[test]
fn test_top_level_help() {
    let home = TempDir::new().unwrap();
    scribe(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("deploy"));
}

#[test]
fn test_serve_help() {
    let home = TempDir::new().unwrap();
    scribe(&home)
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Address to bind to"))
        .stdout(predicate::str::contains("--cors-permissive"));
}

#[test]
fn test_db_migrate_help() {
    let home = TempDir::new().unwrap();
    scribe(&home)
        .args(["db", "migrate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Create or upgrade the schema"));
}

#[test]
fn test_roles_insert_help() {
    let home = TempDir::new().unwrap();
    scribe(&home)
        .args(["roles", "insert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moderator"));
}

#[test]
fn test_users_add_self_follows_help() {
    let home = TempDir::new().unwrap();
    scribe(&home)
        .args(["users", "add-self-follows", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("follow themselves"));
}

// === Config ===

#[test]
fn test_config_path_defaults_to_home() {
    let home = TempDir::new().unwrap();
    scribe(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".scribe/config.toml"));
}

#[test]
fn test_config_show_masks_secret() {
    let home = TempDir::new().unwrap();
    scribe(&home)
        .env("SECRET_KEY", "hunter2")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_config_file_is_read() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("custom.toml");
    std::fs::write(
        &file,
        "secret_key = \"from-file\"\n\n[pagination]\nposts_per_page = 7\n",
    )
    .unwrap();

    scribe(&home)
        .args(["config", "show", "--config"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("posts_per_page = 7"));
}

#[test]
fn test_config_validate_requires_secret() {
    let home = TempDir::new().unwrap();
    scribe(&home)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SECRET_KEY"));
}

#[test]
fn test_config_validate_passes_with_secret() {
    let home = TempDir::new().unwrap();
    scribe(&home)
        .env("SECRET_KEY", "hunter2")
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration valid"));
}

// === Serve ===

#[test]
fn test_serve_refuses_to_start_without_secret() {
    let home = TempDir::new().unwrap();
    scribe(&home)
        .args(["serve", "--database-url", "postgres://scribe@127.0.0.1:1/scribe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SECRET_KEY"));
}

// === Completions ===

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    scribe(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scribe"));
}
