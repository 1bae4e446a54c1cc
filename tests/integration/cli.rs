// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests of the binary.

use std::{io::Write, process::Output, str::from_utf8};

use assert_cmd::{output::OutputError, Command};
use tempfile::TempDir;

use crate::RUN_FILE;

fn ground_tod() -> Command {
    Command::cargo_bin("ground-tod").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

fn write_run_file(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("run.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path.display().to_string()
}

#[test]
fn test_run_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let run_file = write_run_file(&tmp_dir, RUN_FILE);

    let cmd = ground_tod().args([run_file.as_str(), "--workers", "3"]).ok();
    assert!(cmd.is_ok(), "ground-tod failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("ground-tod complete."));
}

#[test]
fn test_dry_run() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let run_file = write_run_file(&tmp_dir, RUN_FILE);

    let cmd = ground_tod().args([run_file.as_str(), "--dry-run"]).ok();
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Dry run"));
}

#[test]
fn test_bad_run_file_fails() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let run_file = write_run_file(&tmp_dir, &RUN_FILE.replace("el_deg = 70.0", "el_deg = 0.5"));

    let cmd = ground_tod().args([run_file.as_str()]).ok();
    assert!(cmd.is_err());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("elevation") || stdout.contains("Elevation"));
}
