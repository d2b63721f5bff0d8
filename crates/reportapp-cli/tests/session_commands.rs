use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{any, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn temp_home() -> TempDir {
    TempDir::new().expect("create temp reportapp home")
}

#[tokio::test]
async fn test_login_status_logout_cycle() {
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"email": "ana@example.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("reportapp")
        .env("REPORTAPP_HOME", home.path())
        .env("REPORTAPP_API_BASE_URL", server.uri())
        .args(["login", "--email", "ana@example.com", "--password", "pw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as ana@example.com"));

    let session = fs::read_to_string(home.path().join("session.json")).unwrap();
    assert!(session.contains("abc"));

    cargo_bin_cmd!("reportapp")
        .env("REPORTAPP_HOME", home.path())
        .env("REPORTAPP_API_BASE_URL", server.uri())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in"));

    cargo_bin_cmd!("reportapp")
        .env("REPORTAPP_HOME", home.path())
        .env("REPORTAPP_API_BASE_URL", server.uri())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out."));

    assert!(!home.path().join("session.json").exists());

    cargo_bin_cmd!("reportapp")
        .env("REPORTAPP_HOME", home.path())
        .env("REPORTAPP_API_BASE_URL", server.uri())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[tokio::test]
async fn test_login_rejected_keeps_no_session() {
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "nope"})))
        .mount(&server)
        .await;

    cargo_bin_cmd!("reportapp")
        .env("REPORTAPP_HOME", home.path())
        .env("REPORTAPP_API_BASE_URL", server.uri())
        .args(["login", "--email", "ana@example.com", "--password", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Incorrect email or password."));

    assert!(!home.path().join("session.json").exists());
}

#[tokio::test]
async fn test_register_password_mismatch_makes_no_request() {
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    cargo_bin_cmd!("reportapp")
        .env("REPORTAPP_HOME", home.path())
        .env("REPORTAPP_API_BASE_URL", server.uri())
        .args([
            "register",
            "--name",
            "Ana",
            "--email",
            "a@b.com",
            "--password",
            "p1",
            "--confirm-password",
            "p2",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Passwords do not match."));
}

#[tokio::test]
async fn test_register_success() {
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_json(json!({"name": "Ana", "email": "a@b.com", "password": "p1"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("reportapp")
        .env("REPORTAPP_HOME", home.path())
        .env("REPORTAPP_API_BASE_URL", server.uri())
        .args([
            "register",
            "--name",
            "Ana",
            "--email",
            "a@b.com",
            "--password",
            "p1",
            "--confirm-password",
            "p1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Account created"));
}

#[tokio::test]
async fn test_reset_password_invalid_email() {
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    cargo_bin_cmd!("reportapp")
        .env("REPORTAPP_HOME", home.path())
        .env("REPORTAPP_API_BASE_URL", server.uri())
        .args(["reset-password", "--email", "not-an-email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid email address."));
}

#[tokio::test]
async fn test_profile_show() {
    let home = temp_home();
    fs::write(home.path().join("session.json"), r#"{"token": "tok"}"#).unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"name": "Ana", "email": "a@b.com"}
        })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("reportapp")
        .env("REPORTAPP_HOME", home.path())
        .env("REPORTAPP_API_BASE_URL", server.uri())
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ana"))
        .stdout(predicate::str::contains("a@b.com"));
}
