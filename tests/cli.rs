//! Binary tests with temporary databases.

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

fn salesesy(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("salesesy").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("SALESESY_SERVER")
        .env("LOG_LEVEL", "silent")
        .env("SALESESY_DB", dir.path().join("crm.db"));
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

/// A base URL nothing listens on.
fn dead_server() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[test]
fn version_reports_crate_version() {
    let dir = TempDir::new().unwrap();
    let output = salesesy(&dir).args(["version", "--json"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn init_then_seed() {
    let dir = TempDir::new().unwrap();

    let output = salesesy(&dir).args(["init", "--json"]).output().unwrap();
    assert!(output.status.success());
    assert!(dir.path().join("crm.db").exists());

    let output = salesesy(&dir).args(["init"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));

    let output = salesesy(&dir).args(["seed", "--json"]).output().unwrap();
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["contacts"], 3);
    assert_eq!(report["stages"], 6);

    let output = salesesy(&dir).args(["seed"]).output().unwrap();
    assert_eq!(output.status.code(), Some(4));

    let output = salesesy(&dir).args(["seed", "--reset", "--json"]).output().unwrap();
    assert!(output.status.success());
}

#[test]
fn seed_without_init_fails() {
    let dir = TempDir::new().unwrap();
    let output = salesesy(&dir).args(["seed", "--json"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let err: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["error"]["code"], "NOT_INITIALIZED");
}

#[test]
fn leaderboard_needs_server_unless_falling_back() {
    let dir = TempDir::new().unwrap();
    let server = dead_server();

    let output = salesesy(&dir)
        .args(["leaderboard", "--server", &server])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));

    let output = salesesy(&dir)
        .args(["leaderboard", "--json", "--demo-fallback", "--limit", "2", "--server", &server])
        .output()
        .unwrap();
    assert!(output.status.success());
    let board = stdout_json(&output);
    assert_eq!(board["companies"].as_array().unwrap().len(), 2);
    assert_eq!(board["companies"][0]["name"], "Globex Corporation");
    assert_eq!(board["totals"]["dealCount"], 10);
}

#[test]
fn view_renders_requested_tab_from_demo_data() {
    let dir = TempDir::new().unwrap();
    let server = dead_server();

    let output = salesesy(&dir)
        .args(["view", "tasks", "--json", "--demo-fallback", "--server", &server])
        .output()
        .unwrap();
    assert!(output.status.success());
    let view = stdout_json(&output);
    assert_eq!(view["tab"], "tasks");
    assert_eq!(view["source"], "demo");
    assert_eq!(view["content"].as_array().unwrap().len(), 5);

    let output = salesesy(&dir)
        .args(["view", "companies", "--company", "acme inc.", "--demo-fallback", "--no-color", "--server", &server])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("Acme Inc."), "{text}");
}

#[test]
fn overview_from_demo_data() {
    let dir = TempDir::new().unwrap();
    let output = salesesy(&dir)
        .args(["overview", "--json", "--demo-fallback", "--server", &dead_server()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let overview = stdout_json(&output);
    assert_eq!(overview["totals"]["count"], 10);
    assert_eq!(overview["pipeline"], "Sales Pipeline");
    assert_eq!(overview["topDeals"][0]["name"], "Enterprise support expansion");
}

#[test]
fn completions_generate() {
    let dir = TempDir::new().unwrap();
    let output = salesesy(&dir).args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("salesesy"));
}
