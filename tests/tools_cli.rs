//! End-to-end runs of the smaller subcommands.

mod common;

use std::fs;

use common::{envelope, stdout, Sandbox};
use serde_json::json;

#[test]
fn extract_reads_default_file() {
    let sandbox = Sandbox::new();
    fs::write(
        sandbox.path().join("parts.txt"),
        "foo/bar/baz.mu\nx/model.mu\nfoo/readme.txt\n",
    )
    .unwrap();

    let output = sandbox.run(&["extract"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "foo/bar/baz.mu -> baz\n");
}

#[test]
fn extract_reads_stdin() {
    let sandbox = Sandbox::new();
    let output = sandbox.run_with_stdin(&["extract", "-"], "a/engine.mu\r\nb/model.mu\n");
    assert_eq!(stdout(&output), "a/engine.mu -> engine\n");
}

#[test]
fn extract_missing_file_is_an_error() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["extract", "nope.txt"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).starts_with("FATAL: "));
}

#[test]
fn csv_rewrites_second_column_with_default_rule() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.path().join("input.csv"), "64720,64720x,64720\n1,2,3\n").unwrap();

    let output = sandbox.run(&["csv"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).starts_with("Processing complete."));
    assert_eq!(
        fs::read_to_string(sandbox.path().join("output.csv")).unwrap(),
        "64720,32938x,64720\n1,2,3\n"
    );
}

#[test]
fn csv_flags_override_rules_and_column() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.path().join("in.csv"), "aa,bb,aa\n").unwrap();

    let output = sandbox.run(&[
        "--format", "json", "csv", "--input", "in.csv", "--output", "out.csv", "--column", "3",
        "--replace", "aa=cc",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let body = envelope(&output);
    assert_eq!(body["data"]["rows"], 1);
    assert_eq!(body["data"]["changedCells"], 1);
    assert_eq!(
        fs::read_to_string(sandbox.path().join("out.csv")).unwrap(),
        "aa,bb,cc\n"
    );
}

#[test]
fn csv_missing_input_exits_1() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--format", "json", "csv"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(envelope(&output)["error"]["code"], "internal.io_error");
    assert!(!sandbox.path().join("output.csv").exists());
}

#[cfg(unix)]
#[test]
fn restart_failure_exits_20() {
    use std::os::unix::fs::PermissionsExt;

    let sandbox = Sandbox::new();
    let pm2 = sandbox.path().join("pm2");
    fs::write(&pm2, "#!/bin/sh\necho 'no dump file' >&2\nexit 3\n").unwrap();
    fs::set_permissions(&pm2, fs::Permissions::from_mode(0o755)).unwrap();
    sandbox.write_config(json!({
        "restart": {
            "pm2_binary": pm2.display().to_string(),
            "compose_dir": sandbox.path().display().to_string(),
        }
    }));

    let output = sandbox.run(&["restart"]);

    assert_eq!(output.status.code(), Some(20));
    assert!(stdout(&output).contains("FATAL: "));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no dump file"));
}

#[test]
fn json_format_prints_prettier_layout() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.path().join("info.json"), r#"{"name":"mod","tags":["a","b"]}"#).unwrap();

    let output = sandbox.run(&["json", "format", "info.json"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output),
        "{\n  \"name\": \"mod\",\n  \"tags\": [\"a\", \"b\"]\n}\n"
    );
}

#[test]
fn config_set_then_show() {
    let sandbox = Sandbox::new();

    let set = sandbox.run(&["config", "set", "/defaults/restart/process_id", "\"7\""]);
    assert_eq!(set.status.code(), Some(0));

    let show = sandbox.run(&["--format", "json", "config", "show"]);
    let body = envelope(&show);
    assert_eq!(body["data"]["config"]["defaults"]["restart"]["process_id"], "7");
    assert_eq!(body["data"]["config"]["defaults"]["csv"]["column"], 2);
}

#[test]
fn config_rejects_relative_pointer() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["config", "set", "defaults/x", "1"]);
    assert_eq!(output.status.code(), Some(1));
}

#[cfg(unix)]
#[test]
fn changelog_groups_commits_per_tag() {
    let sandbox = Sandbox::new();
    let repo = sandbox.path().join("mod");
    sandbox.init_repo(&repo);
    sandbox.git(&repo, &["commit", "-q", "--allow-empty", "-m", "feat: trains"]);
    sandbox.git(&repo, &["tag", "v1.0.0"]);
    sandbox.git(&repo, &["commit", "-q", "--allow-empty", "-m", "fix: signals\n\n- gui: wider buttons"]);

    let output = sandbox.run(&["changelog", "--repo", "mod"]);
    assert_eq!(output.status.code(), Some(0), "{}", stdout(&output));

    let text = fs::read_to_string(repo.join("changelog.txt")).unwrap();
    let entries: Vec<&str> = text.split(&"-".repeat(99)).filter(|s| !s.is_empty()).collect();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].starts_with("\nVersion: Unreleased\nDate: "));
    assert!(entries[0].contains("  Bugfixes:\n    - signals\n  Gui:\n    - wider buttons"));
    assert!(entries[1].starts_with("\nVersion: 1.0.0\n"));
    assert!(entries[1].contains("  Features:\n    - trains"));
}

#[cfg(unix)]
#[test]
fn changelog_without_tags_fails() {
    let sandbox = Sandbox::new();
    let repo = sandbox.path().join("mod");
    sandbox.init_repo(&repo);

    let output = sandbox.run(&["--format", "json", "changelog", "--repo", "mod"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(envelope(&output)["error"]["code"], "changelog.no_tags");
}
