//! # pubstream CLI Apply Integration Tests
//!
//! File: cli/tests/apply.rs
//!
//! ## Overview
//!
//! Runs `pubstream apply` end to end against temporary directories: writing,
//! line endings, rejected headers, exit codes, dry runs, backups, archives
//! and reports.
//!

mod common;
use common::*;
use predicates::prelude::*;
use std::fs;
use std::io::Read;

const TWO_FILES: &str = "\
Here is the project.

FILE: backend/app/main.py
```python
print('hi')
```
END FILE

--- FILE: frontend/index.html ---
<h1>Hello</h1>
";

#[test]
fn test_apply_writes_blocks_with_lf() {
    let dir = workspace_with_stream(TWO_FILES);
    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt", "-r", "site", "--eol", "lf"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Files parsed: 2")
                .and(predicate::str::contains("[WROTE]"))
                .and(predicate::str::contains("Written: 2, failed: 0, invalid: 0")),
        );

    let site = dir.path().join("site");
    assert_eq!(
        fs::read_to_string(site.join("backend/app/main.py")).unwrap(),
        "print('hi')\n"
    );
    assert_eq!(
        fs::read_to_string(site.join("frontend/index.html")).unwrap(),
        "<h1>Hello</h1>\n"
    );
}

#[test]
fn test_apply_defaults_to_crlf() {
    let dir = workspace_with_stream("FILE: a.txt\none\ntwo\n");
    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt", "-r", "out"])
        .assert()
        .success();
    let bytes = fs::read(dir.path().join("out/a.txt")).unwrap();
    assert_eq!(bytes, b"one\r\ntwo\r\n");
}

#[test]
fn test_apply_utf8_sig_writes_bom() {
    let dir = workspace_with_stream("FILE: a.txt\nx\n");
    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt", "-r", "out", "--encoding", "utf-8-sig", "--eol", "lf"])
        .assert()
        .success();
    let bytes = fs::read(dir.path().join("out/a.txt")).unwrap();
    assert_eq!(bytes, b"\xEF\xBB\xBFx\n");
}

#[test]
fn test_apply_cp1251_encodes_cyrillic() {
    let dir = workspace_with_stream("FILE: ru.txt\nПривет\n");
    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt", "-r", "out", "--encoding", "cp1251", "--eol", "lf"])
        .assert()
        .success();
    let bytes = fs::read(dir.path().join("out/ru.txt")).unwrap();
    assert_eq!(bytes, [0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2, b'\n']);
}

#[test]
fn test_apply_unmappable_content_is_a_write_failure() {
    let dir = workspace_with_stream("FILE: cjk.txt\n日本\nFILE: ok.txt\nok\n");
    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt", "-r", "out", "--encoding", "windows-1251"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Written: 1, failed: 1, invalid: 0"))
        .stderr(predicate::str::contains("cannot be encoded as windows-1251"));
    assert!(!dir.path().join("out/cjk.txt").exists());
}

#[test]
fn test_apply_rejects_unknown_encoding() {
    let dir = workspace_with_stream("FILE: a.txt\nx\n");
    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt", "-r", "out", "--encoding", "klingon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown encoding 'klingon'"));
}

#[test]
fn test_apply_rejects_traversal_and_reserved_names() {
    let dir = workspace_with_stream(
        "FILE: ../escape.txt\nbad\nEND FILE\nFILE: docs/CON.txt\nbad\nEND FILE\nFILE: ok.txt\ngood\n",
    );
    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt", "-r", "root"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Invalid file headers: 2")
                .and(predicate::str::contains("reserved name 'CON.txt'"))
                .and(predicate::str::contains("Written: 1, failed: 0, invalid: 2")),
        );

    assert!(!dir.path().join("escape.txt").exists());
    assert!(!dir.path().join("root/docs").exists());
    assert!(dir.path().join("root/ok.txt").is_file());
}

#[test]
fn test_apply_no_blocks_exits_3() {
    let dir = workspace_with_stream("nothing to see here\n");
    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt", "-r", "root"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No FILE blocks found."));
}

#[test]
fn test_apply_missing_input_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    pubstream_cmd(dir.path())
        .args(["apply", "-i", "missing.txt", "-r", "root"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing.txt"));
}

#[test]
fn test_apply_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    pubstream_cmd(dir.path())
        .args(["apply", "-r", "root", "--eol", "lf"])
        .write_stdin("FILE: from/stdin.txt\npiped\n")
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(dir.path().join("root/from/stdin.txt")).unwrap(),
        "piped\n"
    );
}

#[test]
fn test_apply_dry_run_writes_nothing() {
    let dir = workspace_with_stream(TWO_FILES);
    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt", "-r", "site", "--dry-run", "--zip-out", "site.zip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY]").and(predicate::str::contains("[WROTE]").not()));

    let site = dir.path().join("site");
    assert!(site.is_dir());
    assert_eq!(fs::read_dir(&site).unwrap().count(), 0);
    assert!(!dir.path().join("site.zip").exists());
}

#[test]
fn test_apply_backup_keeps_previous_content() {
    let dir = workspace_with_stream("FILE: a.txt\nnew\n");
    let root = dir.path().join("root");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.txt"), "old").unwrap();

    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt", "-r", "root", "--eol", "lf", "--backup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[BACKUP]"));

    assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "new\n");
    let backups: Vec<_> = fs::read_dir(&root)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("a.txt.bak."))
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(backups[0].path()).unwrap(), "old");
}

#[test]
fn test_apply_zip_out_uses_topname() {
    let dir = workspace_with_stream(TWO_FILES);
    pubstream_cmd(dir.path())
        .args([
            "apply", "-i", "stream.txt", "-r", "site", "--zip-out", "site.zip", "--zip-topname", "Web",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("[ARCHIVE]"));

    let file = fs::File::open(dir.path().join("site.zip")).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 2);
    let mut member = archive.by_name("Web/backend/app/main.py").unwrap();
    let mut content = String::new();
    member.read_to_string(&mut content).unwrap();
    assert_eq!(content, "print('hi')\r\n");
}

#[test]
fn test_apply_quiet_keeps_counts_line() {
    let dir = workspace_with_stream(TWO_FILES);
    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt", "-r", "site", "-q"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Written: 2, failed: 0, invalid: 0")
                .and(predicate::str::contains("Files parsed").not())
                .and(predicate::str::contains("[WROTE]").not()),
        );
}

#[test]
fn test_apply_writes_toml_report() {
    let dir = workspace_with_stream("FILE: a.txt\nA\nFILE: nul.md\nx\n");
    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt", "-r", "root", "--report", "run.toml"])
        .assert()
        .success();

    let body = fs::read_to_string(dir.path().join("run.toml")).unwrap();
    let report: toml::Value = toml::from_str(&body).unwrap();
    assert_eq!(report["parsed"].as_integer(), Some(1));
    assert_eq!(report["written"].as_integer(), Some(1));
    assert_eq!(report["invalid"].as_integer(), Some(1));
    assert_eq!(report["dry_run"].as_bool(), Some(false));
}

#[test]
fn test_apply_reads_settings_from_project_config() {
    let dir = workspace_with_stream("FILE: a.txt\nA\n");
    fs::write(
        dir.path().join(".pubstream.toml"),
        "[apply]\nroot = \"configured\"\neol = \"lf\"\n",
    )
    .unwrap();

    pubstream_cmd(dir.path())
        .args(["apply", "-i", "stream.txt"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(dir.path().join("configured/a.txt")).unwrap(),
        "A\n"
    );
}
