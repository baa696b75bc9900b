//! Integration tests for the maintrack CLI
//!
//! These tests exercise the commands end-to-end using assert_cmd against a
//! database in a temporary directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get a maintrack command bound to a fresh database in `tmp`
fn maintrack(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("maintrack").unwrap();
    cmd.current_dir(tmp.path())
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(tmp.path().join("config.toml"))
        .arg("--database")
        .arg(tmp.path().join("records.db"));
    cmd
}

fn add_equipment(tmp: &TempDir, name: &str, brand: &str) {
    maintrack(tmp)
        .args(["equipment", "add", "--name", name, "--brand", brand])
        .assert()
        .success();
}

// ============================================================================
// Equipment
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    maintrack(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("equipment"))
        .stdout(predicate::str::contains("backup"));
}

#[test]
fn test_equipment_add_and_list_in_order() {
    let tmp = TempDir::new().unwrap();
    add_equipment(&tmp, "Pump-1", "Grundfos");
    add_equipment(&tmp, "Chiller A", "Carrier");

    maintrack(&tmp)
        .args(["equipment", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[0] Pump-1 (Grundfos )"))
        .stdout(predicate::str::contains("[1] Chiller A (Carrier )"))
        .stdout(predicate::str::contains("2 equipment"));
}

#[test]
fn test_equipment_add_requires_name_value() {
    let tmp = TempDir::new().unwrap();
    maintrack(&tmp)
        .args(["equipment", "add", "--name", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required field 'name'"));
}

// ============================================================================
// Tasks and work orders
// ============================================================================

#[test]
fn test_task_without_equipment_is_rejected() {
    let tmp = TempDir::new().unwrap();
    maintrack(&tmp)
        .args([
            "task", "add", "-e", "0", "-d", "2024-03-01", "-D", "Grease", "-f", "monthly",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires at least one registered equipment"));

    maintrack(&tmp)
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 scheduled tasks"));
}

#[test]
fn test_task_with_out_of_range_index_is_rejected() {
    let tmp = TempDir::new().unwrap();
    add_equipment(&tmp, "Pump-1", "Grundfos");

    maintrack(&tmp)
        .args([
            "task", "add", "-e", "3", "-d", "2024-03-01", "-D", "Grease", "-f", "monthly",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_task_and_order_store_equipment_name() {
    let tmp = TempDir::new().unwrap();
    add_equipment(&tmp, "Pump-1", "Grundfos");

    maintrack(&tmp)
        .args([
            "task", "add", "-e", "0", "-d", "2024-03-01", "-D", "Grease", "-f", "monthly",
        ])
        .assert()
        .success();
    maintrack(&tmp)
        .args([
            "order", "add", "-e", "0", "-p", "Ana", "-d", "2024-03-02", "-D", "Replace seal",
        ])
        .assert()
        .success();

    maintrack(&tmp)
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-01 - Pump-1 - Grease (monthly)"));
    maintrack(&tmp)
        .args(["order", "list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"equipo\": \"Pump-1\""))
        .stdout(predicate::str::contains("\"persona\": \"Ana\""));
}

// ============================================================================
// Checklists and search
// ============================================================================

#[test]
fn test_checklist_exact_name() {
    let tmp = TempDir::new().unwrap();
    add_equipment(&tmp, "Chiller A", "Carrier");

    maintrack(&tmp)
        .args(["checklist", "add", "-e", "0", "Check refrigerant level"])
        .assert()
        .success();

    maintrack(&tmp)
        .args(["checklist", "show", "--name", "Chiller A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Check refrigerant level"))
        .stdout(predicate::str::contains("1 entries"));
    maintrack(&tmp)
        .args(["checklist", "show", "--name", "chiller a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 entries"));
}

#[test]
fn test_checklist_remove() {
    let tmp = TempDir::new().unwrap();
    add_equipment(&tmp, "Boiler", "Viessmann");
    maintrack(&tmp)
        .args(["checklist", "add", "-e", "0", "Check pressure"])
        .assert()
        .success();

    maintrack(&tmp)
        .args(["checklist", "remove", "Boiler"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed checklist for Boiler"));
    maintrack(&tmp)
        .args(["checklist", "show", "-e", "0", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_search_is_case_insensitive_on_name_only() {
    let tmp = TempDir::new().unwrap();
    add_equipment(&tmp, "Pump-1", "Grundfos");
    add_equipment(&tmp, "Chiller A", "Carrier");

    maintrack(&tmp)
        .args(["search", "PUMP"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pump-1"))
        .stdout(predicate::str::contains("Chiller A").not());
    maintrack(&tmp)
        .args(["search", "carrier"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// ============================================================================
// Backup
// ============================================================================

#[test]
fn test_backup_export_and_restore() {
    let tmp = TempDir::new().unwrap();
    add_equipment(&tmp, "Chiller A", "Carrier");
    maintrack(&tmp)
        .args(["checklist", "add", "-e", "0", "Check refrigerant level"])
        .assert()
        .success();

    maintrack(&tmp)
        .args(["backup", "export"])
        .assert()
        .success();
    let backup = tmp.path().join("backup.json");
    let text = fs::read_to_string(&backup).unwrap();
    assert!(text.contains("\"equipos\""));
    assert!(text.contains("\"checklist\""));

    add_equipment(&tmp, "Boiler", "Viessmann");

    maintrack(&tmp)
        .args(["backup", "restore", "--yes"])
        .arg(&backup)
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored 1 equipment"));
    maintrack(&tmp)
        .args(["equipment", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Boiler").not());
}

#[test]
fn test_restore_without_field_clears_collection() {
    let tmp = TempDir::new().unwrap();
    add_equipment(&tmp, "Pump-1", "Grundfos");
    maintrack(&tmp)
        .args([
            "task", "add", "-e", "0", "-d", "2024-03-01", "-D", "Grease", "-f", "monthly",
        ])
        .assert()
        .success();

    let backup = tmp.path().join("partial.json");
    fs::write(&backup, r#"{"equipos":[{"nombre":"Press"}]}"#).unwrap();

    maintrack(&tmp)
        .args(["backup", "restore", "-y"])
        .arg(&backup)
        .assert()
        .success();
    maintrack(&tmp)
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 scheduled tasks"));
}

#[test]
fn test_restore_page_download() {
    let tmp = TempDir::new().unwrap();
    let backup = tmp.path().join("backup.json");
    fs::write(
        &backup,
        r#"{"equipos":[{"nombre":"Chiller A","marca":"Carrier","modelo":"30XA","anio":"2018","area":"Roof","potencia":"120kW","tipo":"HVAC","obs":""}],"tareas":[],"ots":[],"checklist":[]}"#,
    )
    .unwrap();

    maintrack(&tmp)
        .args(["backup", "restore", "--yes"])
        .arg(&backup)
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored 1 equipment"));
    maintrack(&tmp)
        .args(["checklist", "add", "-e", "0", "Check refrigerant level"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chiller A"));
}

#[test]
fn test_restore_requires_confirmation() {
    let tmp = TempDir::new().unwrap();
    let backup = tmp.path().join("b.json");
    fs::write(&backup, "{}").unwrap();

    maintrack(&tmp)
        .args(["backup", "restore"])
        .arg(&backup)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn test_restore_invalid_json_reports_corrupt_record() {
    let tmp = TempDir::new().unwrap();
    add_equipment(&tmp, "Pump-1", "Grundfos");
    let backup = tmp.path().join("broken.json");
    fs::write(&backup, "{ not json").unwrap();

    maintrack(&tmp)
        .args(["backup", "restore", "--yes"])
        .arg(&backup)
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt record"));
    maintrack(&tmp)
        .args(["equipment", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pump-1"));
}

// ============================================================================
// Status and config
// ============================================================================

#[test]
fn test_status_json_counts() {
    let tmp = TempDir::new().unwrap();
    add_equipment(&tmp, "Pump-1", "Grundfos");

    maintrack(&tmp)
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"equipment\": 1"))
        .stdout(predicate::str::contains("\"tasks\": 0"));
}

#[test]
fn test_config_show_uses_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[backup]\nfile_name = \"plant.json\"\n",
    )
    .unwrap();

    maintrack(&tmp)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("plant.json"));
}
