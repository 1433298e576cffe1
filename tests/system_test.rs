//! End-to-end tests of the `questpacket` binary.
//!
//! Each test runs the binary in a scratch directory, feeds it commands on
//! stdin and inspects stdout. Logs go to stderr and are ignored.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

// =============================================================================
// Helpers
// =============================================================================

fn run_session(dir: &Path, input: &str) -> Vec<String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_questpacket"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("QUEST_PACKET_ENV")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("binary should start");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("stdin accepts input");

    let output = child.wait_with_output().expect("binary should exit");
    assert!(output.status.success(), "binary exited with {}", output.status);
    String::from_utf8(output.stdout)
        .expect("stdout is UTF-8")
        .lines()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// 1. Shipped quest
// =============================================================================

#[test]
fn test_default_quest_session() {
    let dir = tempfile::tempdir().unwrap();
    let lines = run_session(
        dir.path(),
        "visit https://bing.com\n\
         visit https://google.com\n\
         visit https://google.com\n\
         run x = 1 + 1\n\
         run raise ValueError('boom')\n\
         run init\n\
         run y = x\n\
         quit\n",
    );

    assert_eq!(
        lines,
        vec![
            ">> Rust Quest Started: Visit Google!",
            "0 task(s) completed",
            ">> Rust Task Complete: Google visited!",
            "1 task(s) completed",
            "0 task(s) completed",
            "Code executed successfully",
            "Error: ValueError: boom",
            "Sandbox initialized",
            "Error: NameError: name 'x' is not defined",
        ]
    );
}

#[test]
fn test_status_prints_json_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let lines = run_session(dir.path(), "status\nvisit https://google.com/search\nstatus\n");

    let before: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(before[0]["task_id"], "task-1");
    assert_eq!(before[0]["status"], "PENDING");

    let after: serde_json::Value = serde_json::from_str(lines.last().unwrap()).unwrap();
    assert_eq!(after[0]["status"], "COMPLETED");
}

// =============================================================================
// 2. Configuration
// =============================================================================

#[test]
fn test_config_directory_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("config")).unwrap();
    std::fs::write(
        dir.path().join("config").join("default.toml"),
        r#"
[packet]
start_message = "Docs quest started"

[[tasks]]
quest_id = "docs"
task_id = "open"
description = "Open docs.rs"
completion_message = "Docs opened"
trigger = { match = "domain", host = "docs.rs" }

[sandbox]
failure_prefix = "Failed: "
"#,
    )
    .unwrap();

    let lines = run_session(
        dir.path(),
        "visit https://google.com\nvisit https://docs.rs/tokio\nrun 1 / 0\n",
    );
    assert_eq!(
        lines,
        vec![
            ">> Docs quest started",
            "0 task(s) completed",
            ">> Docs opened",
            "1 task(s) completed",
            "Failed: ZeroDivisionError: division by zero",
        ]
    );
}

#[test]
fn test_multiline_payload_and_unknown_commands() {
    let dir = tempfile::tempdir().unwrap();
    let lines = run_session(
        dir.path(),
        "run total = 0\\ntotal += 5\\nassert total == 5\n\nfly away\n",
    );
    assert_eq!(
        lines,
        vec![
            ">> Rust Quest Started: Visit Google!",
            "Code executed successfully",
            "unknown command: fly away",
        ]
    );
}

#[test]
fn test_deep_and_hidden_nesting_do_not_crash() {
    let dir = tempfile::tempdir().unwrap();
    let input = format!(
        "run x = {}1{}\nrun #\r{}1{}\nrun s = 'a\\nb'\\nassert len(s) == 3\nstatus\n",
        "(".repeat(64),
        ")".repeat(64),
        "(".repeat(600),
        ")".repeat(600),
    );
    let lines = run_session(dir.path(), &input);

    assert_eq!(lines[1], "Code executed successfully");
    assert!(
        lines[2].starts_with("Error: SyntaxError: too many nested parentheses"),
        "{}",
        lines[2]
    );
    assert_eq!(lines[3], "Code executed successfully");
    // The session survives to answer later commands.
    assert!(lines[4].contains("\"task-1\""), "{}", lines[4]);
}
