//! Integration tests for the load/execute/export cycle.

use percolate_csvdb::query::SplitMode;
use percolate_csvdb::{Config, Database};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const PEOPLE: &str = "name,age,score\nAda,36,9.5\nBob,,10.0\n";

fn open_with_people(dir: &Path) -> Database {
    let db = Database::open(Config::with_data_dir(dir)).unwrap();
    db.save_upload("people.csv", PEOPLE.as_bytes()).unwrap();
    db
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap()
}

#[test]
fn test_select_leaves_csvs_unchanged() {
    let dir = tempdir().unwrap();
    let db = open_with_people(dir.path());

    let outcome = db.run("SELECT 1").unwrap();
    assert_eq!(outcome.output, "1\n1");
    assert_eq!(read(dir.path(), "people.csv"), PEOPLE);
}

#[test]
fn test_select_renders_table() {
    let dir = tempdir().unwrap();
    let db = open_with_people(dir.path());

    let outcome = db.run("SELECT * FROM people").unwrap();
    assert_eq!(
        outcome.output,
        "name  age score\n Ada   36   9.5\n Bob NULL  10.0"
    );
}

#[test]
fn test_create_table_as_select_writes_csv() {
    let dir = tempdir().unwrap();
    let db = open_with_people(dir.path());

    let outcome = db
        .run("CREATE TABLE seniors AS SELECT name FROM people WHERE age > 30")
        .unwrap();
    assert_eq!(outcome.output, "(Statement executed successfully)");
    assert_eq!(read(dir.path(), "seniors.csv"), "name\nAda\n");

    let tables: Vec<String> = db.tables().unwrap().into_iter().map(|t| t.table).collect();
    assert_eq!(tables, vec!["people", "seniors"]);
}

#[test]
fn test_drop_table_removes_csv() {
    let dir = tempdir().unwrap();
    let db = open_with_people(dir.path());

    db.run("DROP TABLE people").unwrap();
    assert!(!dir.path().join("people.csv").exists());

    // The table stays gone on later runs.
    let outcome = db.run("SELECT * FROM people").unwrap();
    assert_eq!(outcome.output, "ERROR:\nno such table: people");
}

#[test]
fn test_envelope_is_decoded() {
    let dir = tempdir().unwrap();
    let db = open_with_people(dir.path());

    let outcome = db
        .run(r#""{\"command\": \"SELECT name FROM people WHERE age IS NULL\"}""#)
        .unwrap();
    assert_eq!(outcome.sql, "SELECT name FROM people WHERE age IS NULL");
    assert_eq!(outcome.output, "name\n Bob");
}

#[test]
fn test_insert_then_select() {
    let dir = tempdir().unwrap();
    let db = open_with_people(dir.path());

    let outcome = db
        .run("INSERT INTO people VALUES ('Cy', 20, 1.5); SELECT name FROM people;")
        .unwrap();
    assert_eq!(outcome.output, "name\n Ada\n Bob\n  Cy");
    assert_eq!(
        read(dir.path(), "people.csv"),
        format!("{}Cy,20,1.5\n", PEOPLE)
    );
}

#[test]
fn test_syntax_error_keeps_earlier_effects() {
    let dir = tempdir().unwrap();
    let db = open_with_people(dir.path());

    let outcome = db
        .run("INSERT INTO people VALUES ('Cy', 20, 1.5);\nSELEKT * FROM people")
        .unwrap();
    assert!(outcome.output.starts_with("ERROR:\nnear \"SELEKT\": syntax error"));
    assert!(outcome.output.contains("Line 2:\nSELEKT * FROM people\n^"));
    assert!(read(dir.path(), "people.csv").ends_with("Cy,20,1.5\n"));
}

#[test]
fn test_comments_are_ignored_for_dispatch() {
    let dir = tempdir().unwrap();
    let db = open_with_people(dir.path());

    let sql = "-- who is old?\nSELECT name FROM people WHERE age > 30;\n/* trailing\nnote */";
    let outcome = db.run(sql).unwrap();
    assert_eq!(outcome.output, "name\n Ada");
}

#[test]
fn test_lexical_split_mode() {
    let dir = tempdir().unwrap();
    let config = Config {
        split_mode: SplitMode::Lexical,
        ..Config::with_data_dir(dir.path())
    };
    let db = Database::open(config).unwrap();
    db.save_upload("people.csv", PEOPLE.as_bytes()).unwrap();

    let outcome = db
        .run("INSERT INTO people VALUES ('a;b', 1, 2.0); SELECT name FROM people WHERE age = 1")
        .unwrap();
    assert_eq!(outcome.output, "name\n a;b");
}

#[test]
fn test_broken_csv_skips_command_and_keeps_files() {
    let dir = tempdir().unwrap();
    let db = open_with_people(dir.path());
    db.save_upload("broken.csv", b"a,b\n1,2,3\n").unwrap();

    let outcome = db.run("DROP TABLE people").unwrap();
    assert!(outcome.output.starts_with("ERROR:\nIngest failed"));
    assert!(dir.path().join("people.csv").exists());
    assert!(dir.path().join("broken.csv").exists());
}

#[test]
fn test_reset_then_run_starts_empty() {
    let dir = tempdir().unwrap();
    let db = open_with_people(dir.path());
    db.run("SELECT * FROM people").unwrap();

    db.reset().unwrap();
    let outcome = db.run("SELECT * FROM people").unwrap();
    assert_eq!(outcome.output, "ERROR:\nno such table: people");
    assert!(db.tables().unwrap().is_empty());
}

#[test]
fn test_path_like_table_names_stay_inside_data_dir() {
    let root = tempdir().unwrap();
    let data = root.path().join("data");
    let db = open_with_people(&data);

    let outcome = db.run("CREATE TABLE \"../escape\" AS SELECT 1 AS x").unwrap();
    assert_eq!(outcome.output, "(Statement executed successfully)");
    assert!(!root.path().join("escape.csv").exists());

    let outcome = db.run("CREATE TABLE \"sub/x\" AS SELECT 1 AS x").unwrap();
    assert_eq!(outcome.output, "(Statement executed successfully)");

    // Later commands keep working and the CSVs still mirror the real tables.
    let outcome = db.run("SELECT 1").unwrap();
    assert_eq!(outcome.output, "1\n1");
    assert_eq!(read(&data, "people.csv"), PEOPLE);
    let tables: Vec<String> = db.tables().unwrap().into_iter().map(|t| t.table).collect();
    assert_eq!(tables, vec!["people"]);
}

#[test]
fn test_data_modifying_cte_reports_success() {
    let dir = tempdir().unwrap();
    let db = open_with_people(dir.path());

    let outcome = db
        .run("WITH q AS (SELECT 'Cy' AS n) INSERT INTO people (name) SELECT n FROM q")
        .unwrap();
    assert_eq!(outcome.output, "(Statement executed successfully)");
    assert!(read(dir.path(), "people.csv").ends_with("Cy,,\n"));
}
