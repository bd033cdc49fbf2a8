use predicates::prelude::*;
use tempfile::TempDir;
use std::fs;
mod test_env;
use test_env::{get_cmd, setup_test_env, stdout_json};

fn es_list_json(temp_dir: &TempDir) -> Vec<serde_json::Value> {
    let output = get_cmd(temp_dir)
        .args(["es", "list", "--json"])
        .assert()
        .success();
    let json = stdout_json(output.get_output());
    json.as_array().unwrap().clone()
}

#[test]
fn test_es_add_and_list() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir).args(["add", "Acme"]).assert().success();

    get_cmd(&temp_dir)
        .args([
            "es", "add", "1",
            "--body", "貴社を志望した理由は",
            "--submitted", "2026-10-01",
            "--via", "マイナビ",
            "--result", "pass",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created ES version 1 for company 1"));

    let versions = es_list_json(&temp_dir);
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0]["company"], 1);
    assert_eq!(versions[0]["submitted_at"], "2026-10-01");
    assert_eq!(versions[0]["submitted_via"], "マイナビ");
    assert_eq!(versions[0]["result"], "PASS");

    get_cmd(&temp_dir)
        .args(["es", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme"))
        .stdout(predicate::str::contains("PASS"));
}

#[test]
fn test_es_defaults_to_unknown_result() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir).args(["add", "Acme"]).assert().success();
    get_cmd(&temp_dir).args(["es", "add", "1"]).assert().success();

    let versions = es_list_json(&temp_dir);
    assert_eq!(versions[0]["result"], "UNKNOWN");
    assert!(versions[0]["submitted_at"].is_null());
}

#[test]
fn test_es_body_from_file() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir).args(["add", "Acme"]).assert().success();

    let body_path = temp_dir.path().join("es.txt");
    fs::write(&body_path, "学生時代に力を入れたこと\n二行目").unwrap();
    get_cmd(&temp_dir)
        .args(["es", "add", "1", "--body-file"])
        .arg(&body_path)
        .assert()
        .success();

    get_cmd(&temp_dir)
        .args(["es", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ES 1 for company 1 (Acme)"))
        .stdout(predicate::str::contains("学生時代に力を入れたこと"))
        .stdout(predicate::str::contains("二行目"));
}

#[test]
fn test_es_modify() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir).args(["add", "Acme"]).assert().success();
    get_cmd(&temp_dir)
        .args(["es", "add", "1", "--submitted", "2026-10-01"])
        .assert()
        .success();

    get_cmd(&temp_dir)
        .args(["es", "modify", "1", "--result", "FAIL", "--submitted", "none", "--memo", "再提出"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Modified ES version 1"));

    let versions = es_list_json(&temp_dir);
    assert_eq!(versions[0]["result"], "FAIL");
    assert!(versions[0]["submitted_at"].is_null());
    assert_eq!(versions[0]["memo"], "再提出");
}

#[test]
fn test_es_for_missing_company() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir)
        .args(["es", "add", "99"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Company 99 not found"));

    get_cmd(&temp_dir)
        .args(["es", "list", "99"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_es_invalid_result() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir).args(["add", "Acme"]).assert().success();

    get_cmd(&temp_dir)
        .args(["es", "add", "1", "--result", "maybe"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid result 'maybe'"));
}

#[test]
fn test_es_delete() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir).args(["add", "Acme"]).assert().success();
    get_cmd(&temp_dir).args(["es", "add", "1"]).assert().success();

    get_cmd(&temp_dir)
        .args(["es", "delete", "1"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled."));
    assert_eq!(es_list_json(&temp_dir).len(), 1);

    get_cmd(&temp_dir)
        .args(["es", "delete", "1", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted ES version 1"));
    assert!(es_list_json(&temp_dir).is_empty());
}

#[test]
fn test_company_delete_removes_es_versions() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir).args(["add", "Acme"]).assert().success();
    get_cmd(&temp_dir).args(["add", "Globex"]).assert().success();
    get_cmd(&temp_dir).args(["es", "add", "1"]).assert().success();
    get_cmd(&temp_dir).args(["es", "add", "1"]).assert().success();
    get_cmd(&temp_dir).args(["es", "add", "2"]).assert().success();

    get_cmd(&temp_dir)
        .args(["delete", "1"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("and its 2 ES version(s)"));

    get_cmd(&temp_dir).args(["delete", "1", "-y"]).assert().success();

    let versions = es_list_json(&temp_dir);
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0]["company"], 2);
}

#[test]
fn test_es_file_attachment() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir).args(["add", "Acme"]).assert().success();
    let file = temp_dir.path().join("es_final.pdf");
    fs::write(&file, b"%PDF-1.4").unwrap();
    let stored = fs::canonicalize(&file).unwrap().display().to_string();

    get_cmd(&temp_dir)
        .args(["es", "add", "1", "--body", "text", "--file"])
        .arg(&file)
        .assert()
        .success();

    get_cmd(&temp_dir)
        .args(["es", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("File:      {}", stored)));
    assert_eq!(es_list_json(&temp_dir)[0]["file"], stored.as_str());

    get_cmd(&temp_dir)
        .args(["es", "modify", "1", "--file", "none"])
        .assert()
        .success();
    assert!(es_list_json(&temp_dir)[0]["file"].is_null());
}

#[test]
fn test_es_file_validation() {
    let (temp_dir, _guard) = setup_test_env();
    get_cmd(&temp_dir).args(["add", "Acme"]).assert().success();

    let exe = temp_dir.path().join("setup.exe");
    fs::write(&exe, b"MZ").unwrap();
    get_cmd(&temp_dir)
        .args(["es", "add", "1", "--file"])
        .arg(&exe)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("File type '.exe' not allowed"));

    let big = temp_dir.path().join("scan.pdf");
    fs::File::create(&big).unwrap().set_len(10 * 1024 * 1024 + 1).unwrap();
    get_cmd(&temp_dir)
        .args(["es", "add", "1", "--file"])
        .arg(&big)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("File size must be under 10MB"));

    get_cmd(&temp_dir)
        .args(["es", "add", "1", "--file", "missing.pdf"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Cannot read missing.pdf"));

    assert!(es_list_json(&temp_dir).is_empty());
}
