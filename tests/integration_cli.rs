// Drives the compiled binary's one-shot subcommands against a throwaway
// data directory.

use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn drillbook(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("drillbook").unwrap();
    cmd.env("DRILLBOOK_DATA_DIR", home.join("data"))
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env_remove("DRILLBOOK_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn stats_reports_bundled_bank() {
    let home = tempdir().unwrap();
    let text = stdout_of(drillbook(home.path()).arg("stats"));
    assert!(text.contains("questions:"));
    assert!(text.contains("single choice"));
    assert!(text.contains("wrong questions: 0"));
    assert!(home.path().join("data").join("drillbook.db").exists());
}

#[test]
fn import_previews_document() {
    let home = tempdir().unwrap();
    let file = home.path().join("bank.json");
    fs::write(
        &file,
        r#"{"questions": [
            {"question": "Is `&mut T` Copy?", "options": ["yes", "no"], "right_answer": "B", "type": "true_false"},
            {"id": 7, "question": "Pick the integer types", "options": [{"letter": "A", "content": "i32"}, {"letter": "B", "content": "f64"}], "right_answer": "A", "score": "2"}
        ]}"#,
    )
    .unwrap();

    let text = stdout_of(drillbook(home.path()).arg("import").arg(&file));
    assert!(text.starts_with("Untitled bank: 2 questions"));
    assert!(text.contains("[true/false] Is `&mut T` Copy?"));
    assert!(text.contains("[multiple choice] Pick the integer types"));
}

#[test]
fn import_rejects_document_without_questions() {
    let home = tempdir().unwrap();
    let file = home.path().join("bank.json");
    fs::write(&file, r#"{"name": "empty"}"#).unwrap();

    let output = drillbook(home.path())
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("questions"));
}

#[test]
fn export_wrong_fails_on_empty_book() {
    let home = tempdir().unwrap();
    drillbook(home.path())
        .arg("export-wrong")
        .arg(home.path().join("out.json"))
        .assert()
        .failure();
    assert!(!home.path().join("out.json").exists());
}

#[test]
fn records_csv_has_header_only_when_empty() {
    let home = tempdir().unwrap();
    let csv_path = home.path().join("records.csv");
    drillbook(home.path())
        .args(["--storage", "json", "records", "--csv"])
        .arg(&csv_path)
        .assert()
        .success();
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.trim(), "date,type,total,correct,wrong,rate");

    let text = stdout_of(drillbook(home.path()).args(["--storage", "json", "records"]));
    assert_eq!(text.trim(), "no practice records yet");
}

#[test]
fn non_tty_stdin_is_rejected_for_tui() {
    let home = tempdir().unwrap();
    drillbook(home.path()).write_stdin("").assert().failure();
}

#[test]
fn stats_survives_unusable_data_dir_and_missing_bank() {
    let home = tempdir().unwrap();
    let blocker = home.path().join("blocker");
    fs::write(&blocker, "").unwrap();

    let text = stdout_of(
        drillbook(home.path())
            .env("DRILLBOOK_DATA_DIR", blocker.join("state"))
            .arg("stats"),
    );
    assert!(text.contains("wrong questions: 0"));
    assert!(text.contains("practice runs:   0"));

    let text = stdout_of(drillbook(home.path()).args(["-q", "/nonexistent_bank_dir", "stats"]));
    assert!(text.contains("questions:       0"));
    assert!(text.contains("correct rate:    0%"));
}
