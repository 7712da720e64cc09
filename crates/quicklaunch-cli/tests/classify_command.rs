use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn quicklaunch_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("quicklaunch")
}

/// Home page with the autoStart fragment resolves to the home handler
#[test]
fn test_classify_home_json() {
    // Arrange
    let mut cmd = Command::new(quicklaunch_bin());
    cmd.args([
        "classify",
        "https://pathofexile2.game.daum.net/main#autoStart",
        "--format",
        "json",
    ]);

    // Act & Assert
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"handler\": \"home\""))
        .stdout(predicate::str::contains("\"outcome\": \"executed\""))
        .stdout(predicate::str::contains("\"auto_start\": true"));
}

/// Completion page outranks the generic launcher rule
#[test]
fn test_classify_completion_table() {
    let mut cmd = Command::new(quicklaunch_bin());
    cmd.args([
        "classify",
        "https://pubsvc.game.daum.net/gamestart/complete.html?gameCode=poe",
        "--format",
        "table",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Field,Value"))
        .stdout(predicate::str::contains("Handler,completion"))
        .stdout(predicate::str::contains("Outcome,executed"));
}

/// Kakao auth page opened from an unrelated site is rejected
#[test]
fn test_classify_rejected_referrer() {
    let mut cmd = Command::new(quicklaunch_bin());
    cmd.args([
        "classify",
        "https://accounts.kakao.com/login?continue=https%3A%2F%2Fkauth.kakao.com%2Foauth%2Fauthorize",
        "--referrer",
        "https://example.com/",
        "--format",
        "table",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Handler,kakao-auth"))
        .stdout(predicate::str::contains("Outcome,rejected"));
}

#[test]
fn test_classify_unrelated_url() {
    let mut cmd = Command::new(quicklaunch_bin());
    cmd.args(["classify", "https://example.com/", "--format", "table"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Outcome,no-match"));
}

#[test]
fn test_classify_invalid_url_fails() {
    let mut cmd = Command::new(quicklaunch_bin());
    cmd.args(["classify", "not a url"]);

    cmd.assert().failure();
}

#[test]
fn test_classify_requires_url() {
    let mut cmd = Command::new(quicklaunch_bin());
    cmd.arg("classify");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}
