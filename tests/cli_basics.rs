use assert_cmd::cargo; // handy crate for testing CLIs
use predicates::prelude::*;

#[test]
fn prints_help() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("Usage"));
}

#[test]
fn prints_version() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn ask_streams_dummy_reply_without_network() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.args(["--no-model", "ask", "when", "is", "the", "deadline?"])
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "[DUMMY REPLY] model=phi history=0 prompt: when is the deadline?",
        ));
}

#[test]
fn ask_without_streaming() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.args(["--model", "none", "--no-stream", "ask", "hi"])
        .assert()
        .success()
        .stdout(predicates::str::contains("[DUMMY REPLY] model=none"));
}

#[test]
fn chat_keeps_history_between_turns() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.args(["--no-model", "chat"])
        .write_stdin("first\n\nsecond\n/reset\nthird\n/quit\n")
        .assert()
        .success()
        .stdout(
            predicates::str::contains("history=0 prompt: first")
                .and(predicates::str::contains("history=2 prompt: second"))
                .and(predicates::str::contains("(history cleared)"))
                .and(predicates::str::contains("history=0 prompt: third")),
        );
}

#[test]
fn model_and_no_model_conflict() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.args(["--model", "phi", "--no-model", "ask", "hi"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("cannot be used with"));
}

#[test]
fn unreachable_endpoint_reports_connect_error() {
    let mut cmd = cargo::cargo_bin_cmd!();

    cmd.args(["--api-url", "http://127.0.0.1:1/api/chat", "--model", "phi", "ask", "hi"])
        .env_remove("OWLET_API_KEY")
        .assert()
        .failure()
        .stderr(predicates::str::contains("Failed to connect to the API server"));
}
