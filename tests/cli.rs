use std::fs;
use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use predicates::prelude::*;

macro_rules! cargo_run {
    ($($args:expr),*) => {
        {
            let mut cmd = Command::cargo_bin("imlocate")?;
            $(cmd.arg($args);)*
            cmd.assert()
        }
    };
}

#[test]
fn help_lists_subcommands() -> Result<()> {
    cargo_run!("--help")
        .success()
        .stdout(predicate::str::contains("train").and(predicate::str::contains("locate")));
    Ok(())
}

#[test]
fn train_then_show_on_empty_dataset() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let dataset = dir.path().join("train");
    fs::create_dir(&dataset)?;
    let database = dir.path().join("references.db");

    cargo_run!("-d", &database, "train", &dataset).success();
    cargo_run!("-d", &database, "show")
        .success()
        .stdout(predicate::str::contains("0 reference records"));
    Ok(())
}

#[test]
fn locate_runs_over_empty_query_set() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let dataset = dir.path().join("train");
    let queries = dir.path().join("test");
    fs::create_dir(&dataset)?;
    fs::create_dir(&queries)?;
    let database = dir.path().join("references.db");

    cargo_run!("-d", &database, "train", &dataset).success();
    cargo_run!("-d", &database, "locate", &queries).success();
    Ok(())
}

#[test]
fn locate_aborts_without_database() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let queries = dir.path().join("test");
    fs::create_dir(&queries)?;

    cargo_run!("-d", dir.path().join("missing.db"), "locate", &queries)
        .failure()
        .stderr(predicate::str::contains("failed to load reference database"));
    Ok(())
}

#[test]
fn show_aborts_on_corrupt_database() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let database = dir.path().join("references.db");
    fs::write(&database, b"not a database")?;

    cargo_run!("-d", &database, "show")
        .failure()
        .stderr(predicate::str::contains("corrupt database"));
    Ok(())
}
