//! Integration tests for the `univent` CLI binary.
//!
//! Argument parsing, configuration errors, and the validate / checkin
//! flows against a mocked backend. Each test gets its own empty config
//! directory so the user's real profiles are never read.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `univent` binary with env isolation.
fn univent_cmd(home: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("univent");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("UNIVENT_PROFILE")
        .env_remove("UNIVENT_API_URL")
        .env_remove("UNIVENT_TOKEN")
        .env_remove("UNIVENT_EMAIL")
        .env_remove("UNIVENT_PASSWORD")
        .env_remove("UNIVENT_OUTPUT")
        .env_remove("UNIVENT_INSECURE")
        .env_remove("UNIVENT_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

async fn backend(role: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer jwt-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "email": "org@univ.ro",
            "firstName": "Ioana",
            "lastName": "Marin",
            "role": role
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/events/E1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "E1",
            "title": "Career Fair",
            "location": "Aula Magna"
        })))
        .mount(&server)
        .await;
    server
}

async fn mount_verdict(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/tickets/validate"))
        .and(body_json(json!({ "code": "TICKET-001", "eventId": "E1" })))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

fn against(home: &TempDir, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = univent_cmd(home);
    cmd.args(["--api-url", &server.uri(), "--token", "jwt-test", "--color", "never"]);
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = univent_cmd(&home).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    univent_cmd(&home).arg("--help").assert().success().stdout(
        predicate::str::contains("checkin")
            .and(predicate::str::contains("validate"))
            .and(predicate::str::contains("whoami")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    univent_cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("univent"));
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    univent_cmd(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("univent"));
}

#[test]
fn test_checkin_requires_event() {
    let home = tempfile::tempdir().unwrap();
    univent_cmd(&home)
        .arg("checkin")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--event"));
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_without_config_reports_usage_error() {
    let home = tempfile::tempdir().unwrap();
    univent_cmd(&home)
        .args(["validate", "TICKET-001", "--event", "E1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No backend configured"));
}

#[test]
fn test_unknown_profile_is_reported() {
    let home = tempfile::tempdir().unwrap();
    univent_cmd(&home)
        .args(["--profile", "ghost", "whoami"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Profile 'ghost' not found"));
}

#[test]
fn test_config_set_creates_default_profile() {
    let home = tempfile::tempdir().unwrap();
    univent_cmd(&home)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No profiles configured"));

    univent_cmd(&home)
        .args(["config", "set", "api_url", "https://univent.test"])
        .assert()
        .success();

    univent_cmd(&home)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    univent_cmd(&home)
        .args(["config", "set", "site", "main"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

// ── Validate ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_validate_accepted_ticket() {
    let home = tempfile::tempdir().unwrap();
    let server = backend("ORGANIZER").await;
    mount_verdict(
        &server,
        200,
        json!({ "valid": true, "message": "Acces permis", "subjectName": "Ana Pop" }),
    )
    .await;

    let mut cmd = against(&home, &server);
    cmd.args(["validate", "TICKET-001", "--event", "E1"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(0), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[ ACCEPTED ]"), "{stdout}");
    assert!(stdout.contains("Ana Pop"), "{stdout}");
}

#[tokio::test]
async fn test_validate_json_output() {
    let home = tempfile::tempdir().unwrap();
    let server = backend("ADMIN").await;
    mount_verdict(&server, 200, json!({ "valid": true, "message": "Acces permis" })).await;

    let mut cmd = against(&home, &server);
    cmd.args(["validate", "TICKET-001", "--event", "E1", "--output", "json-compact"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(0), "{}", combined_output(&output));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["valid"], true);
    assert_eq!(value["message"], "Acces permis");
}

#[tokio::test]
async fn test_validate_rejected_ticket_exits_nonzero() {
    let home = tempfile::tempdir().unwrap();
    let server = backend("ORGANIZER").await;
    mount_verdict(&server, 409, json!({ "message": "Bilet deja folosit" })).await;

    let mut cmd = against(&home, &server);
    cmd.args(["validate", "TICKET-001", "--event", "E1"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("[ REJECTED ]"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Bilet deja folosit"));
}

#[tokio::test]
async fn test_validate_backend_failure_uses_generic_message() {
    let home = tempfile::tempdir().unwrap();
    let server = backend("ORGANIZER").await;
    mount_verdict(&server, 500, json!({ "message": "NullPointerException" })).await;

    let mut cmd = against(&home, &server);
    cmd.args(["validate", "TICKET-001", "--event", "E1"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Ticket validation failed, please try again"),
        "{stdout}"
    );
    assert!(!stdout.contains("NullPointerException"));
}

#[tokio::test]
async fn test_student_cannot_validate() {
    let home = tempfile::tempdir().unwrap();
    let server = backend("STUDENT").await;

    let mut cmd = against(&home, &server);
    cmd.args(["validate", "TICKET-001", "--event", "E1"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(5));
    assert!(combined_output(&output).contains("Access denied"));
    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .all(|r| r.url.path() != "/api/tickets/validate")
    );
}

#[tokio::test]
async fn test_expired_token_is_auth_failure() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired" })))
        .mount(&server)
        .await;

    let mut cmd = against(&home, &server);
    cmd.arg("whoami");
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3));
}

// ── Whoami / Checkin ────────────────────────────────────────────────

#[tokio::test]
async fn test_whoami_shows_role() {
    let home = tempfile::tempdir().unwrap();
    let server = backend("ORGANIZER").await;

    let mut cmd = against(&home, &server);
    cmd.args(["whoami", "--output", "plain"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(0), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("org@univ.ro"));
}

#[tokio::test]
async fn test_checkin_manual_station_validates_typed_code() {
    let home = tempfile::tempdir().unwrap();
    let server = backend("ORGANIZER").await;
    mount_verdict(
        &server,
        200,
        json!({ "valid": true, "message": "Acces permis", "subjectName": "Ana Pop" }),
    )
    .await;

    let mut cmd = against(&home, &server);
    cmd.args(["checkin", "--event", "E1", "--manual"])
        .write_stdin("TICKET-001\n");
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(0), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("[ ACCEPTED ]"), "{stdout}");
    assert!(stderr.contains("Checking in: Career Fair @ Aula Magna"), "{stderr}");
    assert!(stderr.contains("1 accepted, 0 rejected"), "{stderr}");
}

#[tokio::test]
async fn test_checkin_station_reports_every_attendee() {
    let home = tempfile::tempdir().unwrap();
    let server = backend("ORGANIZER").await;
    mount_verdict(
        &server,
        200,
        json!({ "valid": true, "message": "Acces permis", "subjectName": "Ana Pop" }),
    )
    .await;

    let mut cmd = against(&home, &server);
    cmd.args(["checkin", "--event", "E1", "--manual"])
        .write_stdin("TICKET-001\n\nTICKET-001\n\nTICKET-001\n\n");
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(0), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stdout.matches("[ ACCEPTED ]").count(), 3, "{stdout}");
    assert!(stderr.contains("3 accepted, 0 rejected"), "{stderr}");
}

#[tokio::test]
async fn test_checkin_json_lines_per_verdict() {
    let home = tempfile::tempdir().unwrap();
    let server = backend("ORGANIZER").await;
    mount_verdict(&server, 409, json!({ "message": "Bilet deja folosit" })).await;

    let mut cmd = against(&home, &server);
    cmd.args(["checkin", "--event", "E1", "--manual", "--output", "json-compact"])
        .write_stdin("TICKET-001\n\nTICKET-001\n");
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(0), "{}", combined_output(&output));
    let verdicts: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(verdicts.len(), 2);
    assert!(verdicts.iter().all(|v| v["valid"] == false));
    assert!(verdicts.iter().all(|v| v["message"] == "Bilet deja folosit"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("0 accepted, 2 rejected"));
}

#[tokio::test]
async fn test_checkin_unknown_event() {
    let home = tempfile::tempdir().unwrap();
    let server = backend("ORGANIZER").await;

    let mut cmd = against(&home, &server);
    cmd.args(["checkin", "--event", "E404", "--manual"]).write_stdin("");
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}
