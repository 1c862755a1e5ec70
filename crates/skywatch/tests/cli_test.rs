//! Integration tests for the `skywatch` CLI binary.
//!
//! Argument parsing, config management and error handling run offline;
//! backend-bound commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `skywatch` binary with env isolation.
///
/// Clears all `SKYWATCH_*` env vars and points the config file at
/// `config` so tests never touch the user's real configuration.
fn skywatch_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("skywatch");
    cmd.env("HOME", "/tmp/skywatch-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/skywatch-cli-test-nonexistent")
        .env("SKYWATCH_CONFIG", config)
        .env("NO_COLOR", "1")
        .env_remove("SKYWATCH_PROFILE")
        .env_remove("SKYWATCH_BACKEND")
        .env_remove("SKYWATCH_EMAIL")
        .env_remove("SKYWATCH_PASSWORD")
        .env_remove("SKYWATCH_OUTPUT")
        .env_remove("SKYWATCH_INSECURE")
        .env_remove("SKYWATCH_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn isolated() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    (dir, config)
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run_blocking(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_dir, config) = isolated();
    let output = skywatch_cmd(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (_dir, config) = isolated();
    skywatch_cmd(&config).arg("--help").assert().success().stdout(
        predicate::str::contains("telemetry")
            .and(predicate::str::contains("alerts"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("servo")),
    );
}

#[test]
fn test_version_flag() {
    let (_dir, config) = isolated();
    skywatch_cmd(&config)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("skywatch"));
}

#[test]
fn test_completions_bash() {
    let (_dir, config) = isolated();
    skywatch_cmd(&config)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_no_config_is_usage_error() {
    let (_dir, config) = isolated();
    skywatch_cmd(&config)
        .arg("telemetry")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No backend configured"));
}

#[test]
fn test_unknown_profile() {
    let (_dir, config) = isolated();
    skywatch_cmd(&config)
        .args(["--profile", "nowhere", "status"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nowhere"));
}

#[test]
fn test_config_set_and_show() {
    let (_dir, config) = isolated();

    skywatch_cmd(&config)
        .args(["config", "set", "backend", "http://192.168.4.1:5000/api"])
        .assert()
        .success();
    assert!(config.exists());

    skywatch_cmd(&config)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));

    skywatch_cmd(&config)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://192.168.4.1:5000/api"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let (_dir, config) = isolated();
    skywatch_cmd(&config)
        .args(["config", "set", "api_key", "x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn test_config_use_missing_profile() {
    let (_dir, config) = isolated();
    skywatch_cmd(&config)
        .args(["config", "use", "field"])
        .assert()
        .code(4);
}

// ── Local validation ────────────────────────────────────────────────

#[test]
fn test_servo_out_of_range_fails_before_network() {
    let (_dir, config) = isolated();
    skywatch_cmd(&config)
        .args(["--backend", "http://127.0.0.1:9/api", "servo", "2500"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("outside 1000-2000"));
}

// ── Against a backend ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_telemetry_panel_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/telemetry/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "source": "pixhawk",
            "data": {
                "battery": 76,
                "altitude": 35.2,
                "heading": 181,
                "gps": { "fix_type": 3, "satellites_visible": 11 }
            }
        })))
        .mount(&server)
        .await;

    let (_dir, config) = isolated();
    let mut cmd = skywatch_cmd(&config);
    cmd.args(["--backend", &format!("{}/api", server.uri()), "-o", "json", "telemetry"]);
    let output = run_blocking(cmd).await;

    let text = combined_output(&output);
    assert!(output.status.success(), "{text}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"Battery\""), "{stdout}");
    assert!(stdout.contains("76"), "{stdout}");
    assert!(stdout.contains("\"origin\": \"live\""), "{stdout}");
    assert!(stdout.contains("Good Fix"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_alerts_plain_newest_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "r1": { "timestamp": "2025-01-01T10:00:00Z", "severity": "high", "confidence": 88 },
            "r2": { "timestamp": "2025-01-02T10:00:00Z", "severity": "medium" }
        })))
        .mount(&server)
        .await;

    let (_dir, config) = isolated();
    let mut cmd = skywatch_cmd(&config);
    cmd.args(["--backend", &format!("{}/api", server.uri()), "-o", "plain", "alerts"]);
    let output = run_blocking(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "r2\nr1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_backend_error_surfaces_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/telemetry/latest"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "MAVLink offline" })))
        .mount(&server)
        .await;

    let (_dir, config) = isolated();
    let mut cmd = skywatch_cmd(&config);
    cmd.args(["--backend", &format!("{}/api", server.uri()), "telemetry"]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("500"), "{text}");
    assert!(text.contains("MAVLink offline"), "{text}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_login_with_env_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "jwt-abc",
            "email": "pilot@skywatch.id",
            "name": "Pilot",
            "role": "Operator"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, config) = isolated();
    let mut cmd = skywatch_cmd(&config);
    cmd.env("SKYWATCH_EMAIL", "pilot@skywatch.id")
        .env("SKYWATCH_PASSWORD", "s3cret")
        .args(["--backend", &format!("{}/api", server.uri()), "login"]);
    let output = run_blocking(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Logged in as Pilot (Operator)"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_login_rejected_is_auth_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Email atau password salah." })))
        .mount(&server)
        .await;

    let (_dir, config) = isolated();
    let mut cmd = skywatch_cmd(&config);
    cmd.env("SKYWATCH_EMAIL", "pilot@skywatch.id")
        .env("SKYWATCH_PASSWORD", "wrong")
        .args(["--backend", &format!("{}/api", server.uri()), "login"]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Email atau password salah."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_stops_when_session_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token expired" })))
        .mount(&server)
        .await;

    let (_dir, config) = isolated();
    let mut cmd = skywatch_cmd(&config);
    cmd.args(["--backend", &format!("{}/api", server.uri()), "watch", "fireAlerts"])
        .timeout(std::time::Duration::from_secs(20));
    let output = run_blocking(cmd).await;

    let text = combined_output(&output);
    assert_eq!(output.status.code(), Some(3), "{text}");
    assert!(text.contains("log in again"), "{text}");
}

// ── Config defaults ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_output_default_from_config_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "r1": { "timestamp": "2025-01-01T10:00:00Z", "severity": "high" }
        })))
        .mount(&server)
        .await;

    let (_dir, config) = isolated();
    std::fs::write(
        &config,
        format!(
            "[defaults]\noutput = \"plain\"\n\n[profiles.default]\nbackend = \"{}/api\"\n",
            server.uri()
        ),
    )
    .unwrap();

    let mut cmd = skywatch_cmd(&config);
    cmd.arg("alerts");
    let output = run_blocking(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "r1");

    let mut cmd = skywatch_cmd(&config);
    cmd.args(["-o", "json", "alerts"]);
    let output = run_blocking(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("\"r1\""));
}
