//! Integration tests for the schema-uml command line.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn schema_uml() -> Command {
    Command::new(env!("CARGO_BIN_EXE_schema-uml"))
}

const MODELS_YAML: &str = r#"
classes:
  - name: Order
    table:
      name: orders
      columns:
        - { name: id, type: INTEGER, primary_key: true }
        - { name: a_id, type: INTEGER }
      foreign_keys:
        - { columns: [a_id], references: accounts, referred_columns: [id] }
      indexes:
        - { name: ix_orders_account, columns: [a_id] }
  - name: Account
    table:
      name: accounts
      columns:
        - { name: id, type: INTEGER, primary_key: true }
        - { name: email, type: VARCHAR(255) }
  - name: AuditMixin
"#;

fn models_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("app")).unwrap();
    fs::write(dir.path().join("app/models.yaml"), MODELS_YAML).unwrap();
    dir
}

#[test]
fn test_render_models_to_stdout() {
    let dir = models_dir();

    let output = schema_uml()
        .args(["render", "app.models", "--models-path"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("/* generated by schema-uml */"));
    assert!(stdout.contains("\"orders\" -> \"accounts\" [label=\"a_id->id\"]"));
    assert!(!stdout.contains("AuditMixin"));
    assert!(!stdout.contains("ix_orders_account"));
}

#[test]
fn test_render_plantuml_with_indices_to_file() {
    let dir = models_dir();
    let out = dir.path().join("erd.puml");

    let output = schema_uml()
        .args(["render", "app.models", "-r", "plantuml", "--include-indices"])
        .arg("--models-path")
        .arg(dir.path())
        .arg("-o")
        .arg(&out)
        .output()
        .unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Diagram written to"));

    let result = fs::read_to_string(&out).unwrap();
    assert!(result.starts_with("@startuml"));
    assert!(result.contains("Class accounts {"));
    assert!(result.contains("    ix_orders_account » INDEX(a_id)"));
    assert!(result.contains("orders <--o accounts: a_id->id"));
    assert!(result.ends_with("@enduml\n"));
}

#[test]
fn test_include_follows_argument_order() {
    let dir = models_dir();

    let output = schema_uml()
        .args(["render", "app.models", "-i", "Order Account"])
        .arg("--models-path")
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let orders = stdout.find("\"orders\" [label=<").unwrap();
    let accounts = stdout.find("\"accounts\" [label=<").unwrap();
    assert!(orders < accounts);
}

#[test]
fn test_per_table_style_override() {
    let dir = models_dir();

    let output = schema_uml()
        .args([
            "render",
            "app.models",
            "--dot-table",
            "bgcolor=white&bgcolor.accounts=yellow",
            "--dot-graph",
            "rankdir=LR",
        ])
        .arg("--models-path")
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pad=0 rankdir=LR]"));
    assert_eq!(stdout.matches("BGCOLOR=\"yellow\"").count(), 1);
    assert_eq!(stdout.matches("BGCOLOR=\"white\"").count(), 1);
}

#[test]
fn test_config_file_with_cli_override() {
    let dir = models_dir();
    let config = dir.path().join("schema-uml.yaml");
    fs::write(
        &config,
        "arguments: [app.models]\nrender: plantuml\ninclude: Account\n",
    )
    .unwrap();

    let output = schema_uml()
        .args(["render", "-r", "dot", "--config"])
        .arg(&config)
        .arg("--models-path")
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("digraph G {"));
    assert!(stdout.contains("\"accounts\" [label=<"));
    assert!(!stdout.contains("\"orders\" [label=<"));
}

#[test]
fn test_include_and_exclude_conflict() {
    let output = schema_uml()
        .args(["render", "postgresql://nobody@unreachable.invalid/db", "-i", "a", "-e", "b"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("use either include or exclude, not both"));
}

#[test]
fn test_mixed_sources_rejected() {
    let output = schema_uml()
        .args(["render", "app.models", "duckdb://"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("both database urls and model modules specified"));
}

#[test]
fn test_missing_source() {
    let output = schema_uml().args(["render"]).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("either a database url or a model module argument is required"));
}

#[test]
fn test_unknown_render_format() {
    let output = schema_uml()
        .args(["render", "app.models", "-r", "mermaid"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown format: mermaid"));
}

#[test]
fn test_in_memory_duckdb_renders_empty_graph() {
    let output = schema_uml()
        .args(["render", "duckdb:///:memory:"])
        .output()
        .unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("digraph G {"));
    assert!(!stdout.contains("[label=<"));
}

#[test]
fn test_completions() {
    let output = schema_uml().args(["completions", "bash"]).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("schema-uml"));
}
