// The binary's exit status and diagnostics

use std::process::{Command, Output};

fn streammix(args: &[&str]) -> Output {
    streammix_with_log(args, "info")
}

fn streammix_with_log(args: &[&str], filter: &str) -> Output {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("streammix.toml");
    std::fs::write(&config, "").unwrap();

    Command::new(env!("CARGO_BIN_EXE_streammix"))
        .current_dir(dir.path())
        .env("RUST_LOG", filter)
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn missing_input_is_reported_by_name() {
    let output = streammix(&["first.mp4", "second.mp4", "nowhere_to_be_found.mp4"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("first.mp4"), "stderr was: {}", stderr);
}

#[test]
fn fatal_diagnostic_survives_silenced_logging() {
    let output = streammix_with_log(&["gone_1.mp4", "gone_2.mp4", "gone_3.mp4"], "off");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("gone_1.mp4"), "stderr was: {}", stderr);
}

#[test]
fn wrong_arity_prints_usage() {
    let output = streammix(&["only.mp4", "two.mp4"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("streammix"), "stderr was: {}", stderr);
    assert!(stderr.contains("got 2 arguments"), "stderr was: {}", stderr);

    let output = streammix(&["key", "a.mp4", "b.mp4", "c.mp4", "d.mp4"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn help_exits_cleanly() {
    let output = streammix(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("path_1"));
}
