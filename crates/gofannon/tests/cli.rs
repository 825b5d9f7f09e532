//! End-to-end tests for the gofannon CLI, driving the real binary
//! against a temporary config file.

use assert_cmd::Command;
use predicates::prelude::*;

fn gofannon() -> Command {
    Command::cargo_bin("gofannon").expect("binary not built")
}

#[test]
fn test_add_list_info_remove_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("mcp_servers.json");
    let config_arg = config.to_string_lossy().to_string();

    // add
    gofannon()
        .args([
            "--config",
            &config_arg,
            "add",
            "sqlite",
            "mcp-server-sqlite",
            "--timeout",
            "10",
            "--persistent",
            "--",
            "--db",
            "/tmp/app.db",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added MCP server 'sqlite'"));

    assert!(config.exists());

    // list
    gofannon()
        .args(["--config", &config_arg, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sqlite"))
        .stdout(predicate::str::contains("persistent"));

    // info
    gofannon()
        .args(["--config", &config_arg, "info", "sqlite"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Command: mcp-server-sqlite"))
        .stdout(predicate::str::contains("Args: --db /tmp/app.db"))
        .stdout(predicate::str::contains("Timeout: 10s"));

    // remove
    gofannon()
        .args(["--config", &config_arg, "remove", "sqlite"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed MCP server 'sqlite'"));

    gofannon()
        .args(["--config", &config_arg, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No MCP servers configured"));
}

#[test]
fn test_add_duplicate_requires_force() {
    let dir = tempfile::tempdir().unwrap();
    let config_arg = dir
        .path()
        .join("mcp_servers.json")
        .to_string_lossy()
        .to_string();

    gofannon()
        .args(["--config", &config_arg, "add", "files", "mcp-files"])
        .assert()
        .success();

    gofannon()
        .args(["--config", &config_arg, "add", "files", "mcp-files"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    gofannon()
        .args([
            "--config",
            &config_arg,
            "add",
            "files",
            "mcp-files-v2",
            "--force",
        ])
        .assert()
        .success();

    gofannon()
        .args(["--config", &config_arg, "info", "files"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mcp-files-v2"));
}

#[test]
fn test_add_sse_server_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let config_arg = dir
        .path()
        .join("mcp_servers.json")
        .to_string_lossy()
        .to_string();

    gofannon()
        .args([
            "--config",
            &config_arg,
            "--json",
            "add",
            "remote",
            "https://mcp.example.com/sse",
            "--sse",
            "-H",
            "Authorization=Bearer token",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"added\""));

    gofannon()
        .args(["--config", &config_arg, "--json", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"transport\": \"sse\""))
        .stdout(predicate::str::contains("https://mcp.example.com/sse"));
}

#[test]
fn test_remove_unknown_server_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config_arg = dir
        .path()
        .join("mcp_servers.json")
        .to_string_lossy()
        .to_string();

    gofannon()
        .args(["--config", &config_arg, "remove", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_add_rejects_bad_env_format() {
    let dir = tempfile::tempdir().unwrap();
    let config_arg = dir
        .path()
        .join("mcp_servers.json")
        .to_string_lossy()
        .to_string();

    gofannon()
        .args([
            "--config",
            &config_arg,
            "add",
            "files",
            "mcp-files",
            "-e",
            "NOT_A_PAIR",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}
