//! Integration tests for the cinema-portal binary
//!
//! None of these reach a real backend: the configured URL points at a closed
//! local port, and signed-in states come from a session file written here.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

struct TestEnv {
    _dir: TempDir,
    config_path: PathBuf,
    session_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        let session_path = dir.path().join("data").join("session.json");

        let config = format!(
            r#"
[api]
base_url = "http://127.0.0.1:9/api"
timeout_secs = 5

[storage]
path = "{}"
"#,
            escape_path_for_toml(&session_path.to_string_lossy())
        );
        fs::write(&config_path, config).unwrap();

        Self {
            _dir: dir,
            config_path,
            session_path,
        }
    }

    /// Pretend a user with `role` signed in earlier
    fn signed_in_as(self, role: &str) -> Self {
        let user = json!({
            "id": "12",
            "fullName": "Nguyen Van A",
            "email": "a@cinema.test",
            "roleName": role,
        });
        let entries = json!({
            "accessToken": "stored-token",
            "refreshToken": "stored-refresh",
            "currentUser": user.to_string(),
        });
        fs::create_dir_all(self.session_path.parent().unwrap()).unwrap();
        fs::write(&self.session_path, entries.to_string()).unwrap();
        self
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("cinema-portal").unwrap();
        cmd.env_remove("PORTAL_API_URL")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config_path);
        cmd
    }

    fn stored_entries(&self) -> Value {
        serde_json::from_str(&fs::read_to_string(&self.session_path).unwrap()).unwrap()
    }
}

// HELP AND ARGUMENT PARSING

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("cinema-portal")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check-in"))
        .stdout(predicate::str::contains("booking-stats"))
        .stdout(predicate::str::contains("EXIT CODES"));
}

#[test]
fn test_invalid_format_rejected() {
    let env = TestEnv::new();
    env.cmd()
        .args(["route", "/", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

#[test]
fn test_missing_config_file_fails() {
    Command::cargo_bin("cinema-portal")
        .unwrap()
        .args(["--config", "/nonexistent/cinema-portal.toml", "route", "/"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read config file"));
}

// ROUTE GUARD

#[test]
fn test_route_redirects_when_signed_out() {
    let env = TestEnv::new();
    env.cmd()
        .args(["route", "/admin/dashboard"])
        .assert()
        .success()
        .stdout(predicate::str::contains("redirect /admin/login"));
}

#[test]
fn test_unknown_route_renders_login() {
    let env = TestEnv::new();
    env.cmd()
        .args(["route", "/somewhere/else"])
        .assert()
        .success()
        .stdout(predicate::str::contains("render /admin/login"));
}

#[test]
fn test_route_respects_stored_role() {
    let env = TestEnv::new().signed_in_as("Staff");

    env.cmd()
        .args(["route", "/staff/dashboard"])
        .assert()
        .success()
        .stdout(predicate::str::contains("render /staff/dashboard"));

    env.cmd()
        .args(["route", "/admin/dashboard"])
        .assert()
        .success()
        .stdout(predicate::str::contains("forbidden"))
        .stdout(predicate::str::contains("Admin"));
}

#[test]
fn test_route_json_output() {
    let env = TestEnv::new().signed_in_as("Admin");

    let output = env
        .cmd()
        .args(["--format", "json", "route", "/admin/dashboard"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["decision"], "render");
    assert_eq!(json["route"], "/admin/dashboard");
}

// ACCESS CONTROL AND EXIT CODES

#[test]
fn test_staff_command_requires_sign_in() {
    let env = TestEnv::new();
    env.cmd()
        .arg("bookings")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Not signed in"));
}

#[test]
fn test_admin_command_rejects_staff() {
    let env = TestEnv::new().signed_in_as("Staff");
    env.cmd()
        .arg("stats")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires the Admin role"));
}

#[test]
fn test_blank_booking_code_is_invalid_input() {
    let env = TestEnv::new().signed_in_as("Staff");
    env.cmd()
        .args(["verify", "  "])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Please enter a booking code"));
}

#[test]
fn test_create_user_requires_fields() {
    let env = TestEnv::new().signed_in_as("Admin");
    env.cmd()
        .args([
            "users",
            "create",
            "--email",
            "new@cinema.test",
            "--fullname",
            " ",
            "--role",
            "Staff",
            "--password-stdin",
        ])
        .write_stdin("secret\n")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Please fill in all required fields!"));
}

#[test]
fn test_role_change_requires_role() {
    let env = TestEnv::new().signed_in_as("Admin");
    env.cmd()
        .args(["users", "role", "7", ""])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Please select a role!"));
}

// LOGIN / LOGOUT

#[test]
fn test_login_rejects_empty_password() {
    let env = TestEnv::new();
    env.cmd()
        .args(["login", "--email", "a@cinema.test", "--password-stdin"])
        .write_stdin("\n")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Password cannot be empty"));
}

#[test]
fn test_login_unreachable_backend() {
    let env = TestEnv::new();
    env.cmd()
        .args(["login", "--email", "a@cinema.test", "--password-stdin"])
        .write_stdin("secret\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Network error"));

    assert!(!env.session_path.exists());
}

#[test]
fn test_whoami_reads_stored_session() {
    let env = TestEnv::new().signed_in_as("Staff");
    env.cmd()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nguyen Van A (Staff)"));
}

#[test]
fn test_whoami_signed_out() {
    let env = TestEnv::new();
    env.cmd().arg("whoami").assert().code(2);
}

#[test]
fn test_logout_clears_session_even_when_backend_is_down() {
    let env = TestEnv::new().signed_in_as("Admin");

    env.cmd()
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out"))
        .stderr(predicate::str::contains("remote logout failed"));

    let entries = env.stored_entries();
    assert!(entries.get("accessToken").is_none());
    assert!(entries.get("currentUser").is_none());

    env.cmd()
        .args(["route", "/admin/dashboard"])
        .assert()
        .stdout(predicate::str::contains("redirect /admin/login"));
}

#[test]
fn test_logout_when_signed_out() {
    let env = TestEnv::new();
    env.cmd()
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));
}
