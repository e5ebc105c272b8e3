use assert_cmd::prelude::*;
use predicates::prelude::*;

#[test]
fn health_show_reports_no_state_when_file_absent() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("health-state.json");

    let mut cmd = assert_cmd::Command::cargo_bin("qte").unwrap();
    cmd.args(["health", "show", "--state", state_path.to_str().unwrap()]);

    cmd.assert().success().stdout(predicate::str::contains("no persisted strategy health state"));
}
