mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::write_methods_csv;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_cli_offline_flow_completes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("methods.csv");
    write_methods_csv(&path)?;

    let mut cmd = Command::new(cargo_bin!());
    cmd.env_remove("PAYFLOW_BASE_URL")
        .args(["--space-id", "42", "--methods"])
        .arg(&path)
        .args(["--select", "7"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Available payment methods:"))
        .stdout(predicate::str::contains("[3] TWINT"))
        .stdout(predicate::str::contains("[7] Visa - Credit card"))
        .stdout(predicate::str::contains("Payment form for Visa"))
        .stdout(predicate::str::contains("Payment completed"))
        .stdout(predicate::str::contains("Outcome: completed"))
        .stderr(predicate::str::contains("flow completed"));

    Ok(())
}

#[test]
fn test_cli_lists_methods_and_cancels_without_selection() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("methods.csv");
    write_methods_csv(&path)?;

    let mut cmd = Command::new(cargo_bin!());
    cmd.env("PAYFLOW_SPACE_ID", "42").arg("--methods").arg(&path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[3] TWINT"))
        .stdout(predicate::str::contains("Outcome: cancelled"))
        .stderr(predicate::str::contains("flow cancelled"));

    Ok(())
}

#[test]
fn test_cli_fails_without_methods() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, "id,name,description,sort_order\n")?;

    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["--space-id", "42", "--select", "1", "--methods"])
        .arg(&path);

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Payment failed"))
        .stderr(predicate::str::contains("code 200"));

    Ok(())
}

#[test]
fn test_cli_rejects_zero_space() {
    let mut cmd = Command::new(cargo_bin!());
    cmd.args(["--space-id", "0"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("space id must not be zero"));
}

#[test]
fn test_cli_log_level_follows_rust_log() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("methods.csv");
    write_methods_csv(&path)?;

    let mut quiet = Command::new(cargo_bin!());
    quiet
        .env("RUST_LOG", "error")
        .args(["--space-id", "42", "--select", "7", "--methods"])
        .arg(&path);
    quiet
        .assert()
        .success()
        .stderr(predicate::str::contains("payment flow started").not());

    let mut verbose = Command::new(cargo_bin!());
    verbose
        .env("RUST_LOG", "debug")
        .args(["--space-id", "42", "--select", "7", "--methods"])
        .arg(&path);
    verbose
        .assert()
        .success()
        .stderr(predicate::str::contains("flow configuration built"));

    let mut default = Command::new(cargo_bin!());
    default
        .env_remove("RUST_LOG")
        .args(["--space-id", "42", "--select", "7", "--methods"])
        .arg(&path);
    default
        .assert()
        .success()
        .stderr(predicate::str::contains("payment flow started"))
        .stderr(predicate::str::contains("flow configuration built").not());

    Ok(())
}
