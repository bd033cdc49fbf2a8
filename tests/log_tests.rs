use predicates::prelude::*;
use tempfile::TempDir;
mod test_env;
use test_env::{get_cmd, setup_test_env, stdout_json};

fn log_json(temp_dir: &TempDir, limit: &str) -> Vec<serde_json::Value> {
    let output = get_cmd(temp_dir)
        .args(["log", "--json", "--limit", limit])
        .assert()
        .success();
    stdout_json(output.get_output()).as_array().unwrap().clone()
}

#[test]
fn test_log_empty() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir)
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes recorded."));
}

#[test]
fn test_log_records_writes() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir).args(["add", "Acme"]).assert().success();
    get_cmd(&temp_dir).args(["modify", "1", "--memo", "OB訪問"]).assert().success();
    get_cmd(&temp_dir).args(["stage", "1", "es", "済"]).assert().success();
    get_cmd(&temp_dir).args(["es", "add", "1", "--body", "text"]).assert().success();
    get_cmd(&temp_dir).args(["es", "delete", "1", "-y"]).assert().success();
    get_cmd(&temp_dir).args(["delete", "1", "-y"]).assert().success();

    let events = log_json(&temp_dir, "0");
    let actions: Vec<&str> = events.iter().map(|e| e["action"].as_str().unwrap()).collect();
    assert_eq!(
        actions,
        vec![
            "COMPANY_DELETE",
            "ES_DELETE",
            "ES_CREATE",
            "COMPANY_UPDATE",
            "COMPANY_UPDATE",
            "COMPANY_CREATE",
        ]
    );
    assert_eq!(events[0]["target_type"], "company");
    assert_eq!(events[0]["payload"]["name"], "Acme");
    assert_eq!(events[1]["target_type"], "es");

    // History survives deletion of the company
    get_cmd(&temp_dir)
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("COMPANY_DELETE"))
        .stdout(predicate::str::contains("Acme [memo]"));
}

#[test]
fn test_log_limit_and_reads_not_recorded() {
    let (temp_dir, _guard) = setup_test_env();

    for name in ["A", "B", "C"] {
        get_cmd(&temp_dir).args(["add", name]).assert().success();
    }
    get_cmd(&temp_dir).args(["list"]).assert().success();
    get_cmd(&temp_dir).args(["show", "1"]).assert().success();

    assert_eq!(log_json(&temp_dir, "0").len(), 3);
    let latest = log_json(&temp_dir, "1");
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0]["payload"]["name"], "C");
}
