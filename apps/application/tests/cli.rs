use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn application() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("application")?;
    cmd.env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn logs_hello_world_at_info() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    application()?
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Hello, world!").and(predicate::str::contains("INFO")));
    Ok(())
}

#[test]
fn level_flag_filters_the_greeting() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    application()?
        .current_dir(tmp.path())
        .args(["--level", "warning"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Hello, world!").not());
    Ok(())
}

#[test]
fn file_logging_writes_dated_file() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    application()?
        .current_dir(tmp.path())
        .args(["--file-logging", "--message", "to disk"])
        .assert()
        .success();

    let logs = tmp.path().join("logs");
    let file = fs::read_dir(&logs)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with("-application.log"))
        })
        .expect("daily log file should exist");
    assert!(fs::read_to_string(file)?.contains("| INFO | to disk"));
    Ok(())
}

#[test]
fn json_format_and_settings_file() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let config = tmp.path().join("custom.toml");
    fs::write(&config, "name = \"service\"\nformat = \"json\"\n")?;

    application()?
        .current_dir(tmp.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("\"logger\":\"service\""));
    Ok(())
}

#[test]
fn unknown_format_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    application()?.args(["--format", "xml"]).assert().failure();
    Ok(())
}

#[test]
fn greeting_points_at_main_under_home_marker() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    application()?
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("| ~/apps/application/src/main.rs:"));
    Ok(())
}
