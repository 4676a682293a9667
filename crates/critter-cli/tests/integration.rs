#![allow(deprecated)]
use assert_cmd::Command;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn critter(dir: &TempDir, server: &Server) -> Command {
    let mut cmd = Command::cargo_bin("critter").unwrap();
    cmd.current_dir(dir.path())
        .env("CRITTER_CONFIG", dir.path().join("settings.yaml"))
        .env("CRITTER_SERVER", server.url())
        .env("CRITTER_USER", "alice")
        .env("CRITTER_PASSWORD", "pw")
        .env_remove("RUST_LOG");
    cmd
}

// ---------------------------------------------------------------------------
// argument validation
// ---------------------------------------------------------------------------

#[test]
fn create_and_update_together_is_rejected_without_calls() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    let any = server.mock("POST", Matcher::Any).expect(0).create();

    critter(&dir, &server)
        .args(["--create", "--update", "CR-1", "--title", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at the same time"));
    any.assert();
}

#[test]
fn empty_update_id_is_rejected_without_calls() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    let any = server.mock("POST", Matcher::Any).expect(0).create();

    critter(&dir, &server)
        .args(["--update", "", "--patch", "fix.diff"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-empty review id"));
    any.assert();
}

#[test]
fn nothing_to_do_is_an_error() {
    let dir = TempDir::new().unwrap();
    let server = Server::new();

    critter(&dir, &server)
        .args(["--title", "orphan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--create"));
}

#[test]
fn unknown_patch_order_is_rejected() {
    let dir = TempDir::new().unwrap();
    let server = Server::new();

    critter(&dir, &server)
        .args(["--create", "--patch-order", "random"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// critter --create
// ---------------------------------------------------------------------------

#[test]
fn create_uploads_piped_diff() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    let diff = "diff --git a/x b/x\n-old\n+new\n";

    let create = server
        .mock("POST", "/rest-service/reviews-v1")
        .match_header("authorization", "Basic YWxpY2U6cHc=")
        .match_body(Matcher::PartialJson(json!({
            "reviewData": {
                "projectKey": "CR",
                "name": "Fix parser",
                "author": {"userName": "alice"}
            }
        })))
        .with_status(200)
        .with_body(r#"{"permaId": {"id": "CR-1"}}"#)
        .expect(1)
        .create();
    let patch = server
        .mock("POST", "/rest-service/reviews-v1/CR-1/addPatch")
        .match_body(Matcher::PartialJson(json!({"patch": diff})))
        .with_status(200)
        .expect(1)
        .create();

    critter(&dir, &server)
        .args(["--create", "--title", "Fix parser"])
        .write_stdin(diff)
        .assert()
        .success()
        .stdout(predicate::str::contains("Review CR-1"))
        .stdout(predicate::str::contains("added 1 patch(es)"));

    create.assert();
    patch.assert();
}

#[test]
fn create_runs_all_stages_in_order_and_reports_json() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    let first = dir.path().join("first.diff");
    let second = dir.path().join("second.diff");
    std::fs::write(&first, "diff first\n").unwrap();
    std::fs::write(&second, "diff second\n").unwrap();

    server
        .mock("POST", "/rest-service/reviews-v1")
        .with_status(200)
        .with_body(r#"{"permaId": {"id": "CR-2"}}"#)
        .create();
    let reviewers = server
        .mock("POST", "/rest-service/reviews-v1/CR-2/reviewers")
        .match_body("bob,carol")
        .with_status(204)
        .expect(1)
        .create();
    let patches = server
        .mock("POST", "/rest-service/reviews-v1/CR-2/addPatch")
        .with_status(200)
        .expect(2)
        .create();
    let changeset = server
        .mock("POST", "/rest-service/reviews-v1/CR-2/addChangeset")
        .match_body(Matcher::PartialJson(json!({
            "repository": "trunk",
            "changesets": {"changesetData": [{"id": "77"}]}
        })))
        .with_status(200)
        .expect(1)
        .create();
    let start = server
        .mock(
            "POST",
            Matcher::Regex(r"^/rest-service/reviews-v1/CR-2/transition".into()),
        )
        .match_query(Matcher::UrlEncoded(
            "action".into(),
            "action:approveReview".into(),
        ))
        .with_status(200)
        .expect(1)
        .create();

    let output = critter(&dir, &server)
        .args(["--create", "--title", "Batch", "--start", "--json"])
        .args(["--reviewers", "bob,carol", "--repository", "trunk"])
        .args(["--changeset", "77"])
        .arg("--patch")
        .arg(&first)
        .arg("--patch")
        .arg(&second)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["review_id"], "CR-2");
    let events: Vec<&str> = report["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    assert_eq!(
        events,
        [
            "review_created",
            "reviewers_added",
            "patches_added",
            "changesets_added",
            "review_started"
        ]
    );
    assert!(report["failures"].as_array().unwrap().is_empty());

    reviewers.assert();
    patches.assert();
    changeset.assert();
    start.assert();
}

#[test]
fn missing_patch_file_still_creates_review() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    let create = server
        .mock("POST", "/rest-service/reviews-v1")
        .with_status(200)
        .with_body(r#"{"permaId": {"id": "CR-3"}}"#)
        .expect(1)
        .create();
    let patch = server
        .mock("POST", Matcher::Regex("addPatch".into()))
        .expect(0)
        .create();

    critter(&dir, &server)
        .args(["--create", "--patch", "missing.diff"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Review CR-3"))
        .stderr(predicate::str::contains("could not open patch"));

    create.assert();
    patch.assert();
}

#[test]
fn create_failure_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    server
        .mock("POST", "/rest-service/reviews-v1")
        .with_status(500)
        .with_body("project CR is closed")
        .create();
    let follow_ups = server
        .mock("POST", Matcher::Regex("CR-".into()))
        .expect(0)
        .create();

    critter(&dir, &server)
        .args(["--create", "--reviewers", "bob", "--start"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to create review"))
        .stderr(predicate::str::contains("project CR is closed"));

    follow_ups.assert();
}

// ---------------------------------------------------------------------------
// critter --update
// ---------------------------------------------------------------------------

#[test]
fn update_adds_committed_revision_from_stdin() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    let changeset = server
        .mock("POST", "/rest-service/reviews-v1/CR-5/addChangeset")
        .match_body(Matcher::PartialJson(json!({
            "changesets": {"changesetData": [{"id": "42"}]}
        })))
        .with_status(200)
        .expect(1)
        .create();
    let patch = server
        .mock("POST", Matcher::Regex("addPatch".into()))
        .expect(0)
        .create();

    critter(&dir, &server)
        .args(["--update", "CR-5", "--repository", "trunk"])
        .write_stdin("Sending foo.c\nTransmitting file data .\nCommitted revision 42.\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("added 1 changeset(s)"));

    changeset.assert();
    patch.assert();
}

#[test]
fn update_survives_a_failed_stage() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    server
        .mock("POST", "/rest-service/reviews-v1/CR-6/reviewers")
        .with_status(404)
        .create();
    let start = server
        .mock(
            "POST",
            Matcher::Regex(r"^/rest-service/reviews-v1/CR-6/transition".into()),
        )
        .with_status(200)
        .expect(1)
        .create();

    critter(&dir, &server)
        .args(["--update", "CR-6", "--reviewers", "nobody", "--start"])
        .assert()
        .success()
        .stdout(predicate::str::contains("started review"))
        .stderr(predicate::str::contains("add_reviewers failed"));

    start.assert();
}

// ---------------------------------------------------------------------------
// critter list
// ---------------------------------------------------------------------------

#[test]
fn list_users_prints_table() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    server
        .mock("GET", "/rest-service/users-v1")
        .with_status(200)
        .with_body(r#"{"userData": [{"userName": "bob", "displayName": "Bob Ross"}]}"#)
        .create();

    critter(&dir, &server)
        .args(["list", "users"])
        .assert()
        .success()
        .stdout(predicate::str::contains("USER"))
        .stdout(predicate::str::contains("Bob Ross"));
}

#[test]
fn list_projects_as_json() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    server
        .mock("GET", "/rest-service/projects-v1")
        .with_status(200)
        .with_body(r#"{"projectData": [{"key": "CR", "name": "Code Review"}]}"#)
        .create();

    let output = critter(&dir, &server)
        .args(["list", "projects", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let projects: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(projects[0]["key"], "CR");
}

// ---------------------------------------------------------------------------
// critter config
// ---------------------------------------------------------------------------

#[test]
fn config_save_writes_effective_settings() {
    let dir = TempDir::new().unwrap();
    let server = Server::new();

    critter(&dir, &server)
        .args(["config", "save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved settings"));

    let written = std::fs::read_to_string(dir.path().join("settings.yaml")).unwrap();
    assert!(written.contains("username: alice"));
    assert!(written.contains(server.host_with_port().as_str()));
}

#[test]
fn config_show_masks_password() {
    let dir = TempDir::new().unwrap();
    let server = Server::new();

    critter(&dir, &server)
        .args(["config", "show"])
        .env("CRITTER_PASSWORD", "hunter2")
        .assert()
        .success()
        .stdout(predicate::str::contains("username:    alice"))
        .stdout(predicate::str::contains("hunter2").not());
}
