use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn cmd() -> Command {
    Command::cargo_bin("streamxml").unwrap()
}

#[test]
fn test_outline_from_stdin() {
    cmd()
        .write_stdin("<catalog><book id=\"1\">Dune</book></catalog>")
        .assert()
        .success()
        .stdout("catalog\n  book id=\"1\": \"Dune\"\n");
}

#[test]
fn test_json_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"<a k=\"v\">x &amp; y</a>").unwrap();

    cmd()
        .arg(file.path())
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"a\""))
        .stdout(predicate::str::contains("\"text\": \"x & y\""))
        .stdout(predicate::str::contains("\"k\": \"v\""));
}

#[test]
fn test_utf16_file_with_bom() {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "<r>\u{e9}</r>".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();

    cmd()
        .arg(file.path())
        .assert()
        .success()
        .stdout("r: \"\u{e9}\"\n");
}

#[test]
fn test_unsorted_keeps_duplicates() {
    cmd()
        .arg("--unsorted")
        .write_stdin("<a b=\"1\" a=\"2\" b=\"3\"/>")
        .assert()
        .success()
        .stdout("a b=\"1\" a=\"2\" b=\"3\"\n");

    cmd()
        .write_stdin("<a b=\"1\" b=\"3\"/>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error at 1:10"));
}

#[test]
fn test_max_depth_is_enforced() {
    cmd()
        .args(["--max-depth", "2"])
        .write_stdin("<a><b><c/></b></a>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error at 1:7"));
}

#[test]
fn test_parse_error_reports_position() {
    cmd()
        .write_stdin("<a>\n  <b></a>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error at 2:6"));
}

#[test]
fn test_missing_file_fails() {
    cmd()
        .arg("/nonexistent/streamxml/input.xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_json_rejects_unbounded_nesting() {
    let depth = 2_000;
    let deep = format!("{}{}", "<n>".repeat(depth), "</n>".repeat(depth));

    cmd()
        .args(["--max-depth", "0", "--format", "json"])
        .write_stdin(deep.clone())
        .assert()
        .failure()
        .stderr(predicate::str::contains("document nests 2000 levels"));

    cmd()
        .args(["--max-depth", "0"])
        .write_stdin(deep)
        .assert()
        .success();
}

#[test]
fn test_json_within_limit() {
    let depth = 300;
    let nested = format!("{}{}", "<n>".repeat(depth), "</n>".repeat(depth));

    cmd()
        .args(["--max-depth", "0", "--format", "json"])
        .write_stdin(nested)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"));
}
