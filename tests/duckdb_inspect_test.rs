//! End-to-end tests against DuckDB database files.

use duckdb::Connection;
use schema_uml::config::Settings;
use schema_uml::filter::Filter;
use schema_uml::inspect::{inspect_urls_with, Registry};
use schema_uml::model::Role;
use schema_uml::render::OutputFormat;
use schema_uml::{generate, UmlError};
use std::path::Path;
use tempfile::TempDir;

const SHOP_SCHEMA: &str = r#"
CREATE TABLE customers (
    id INTEGER PRIMARY KEY,
    name VARCHAR,
    email VARCHAR
);
CREATE TABLE orders (
    id INTEGER PRIMARY KEY,
    customer_id INTEGER REFERENCES customers(id),
    total DECIMAL(10, 2)
);
CREATE TABLE order_items (
    order_id INTEGER REFERENCES orders(id),
    line INTEGER,
    sku VARCHAR,
    PRIMARY KEY (order_id, line)
);
CREATE TABLE audit_log (id INTEGER, message VARCHAR);
CREATE INDEX ix_orders_customer ON orders (customer_id);
CREATE SCHEMA archive;
CREATE TABLE archive.orders (id INTEGER PRIMARY KEY);
"#;

fn create_shop_db(dir: &Path) -> String {
    let path = dir.join("shop.duckdb");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(SHOP_SCHEMA).unwrap();
    drop(conn);
    format!("duckdb:///{}", path.display())
}

fn no_pgpass(dir: &Path) -> std::path::PathBuf {
    dir.join("missing.pgpass")
}

#[test]
fn test_reflects_tables_and_qualifies_other_schemas() {
    let dir = TempDir::new().unwrap();
    let url = create_shop_db(dir.path());

    let diagram =
        inspect_urls_with(&[url], None, &Filter::default(), Some(&no_pgpass(dir.path()))).unwrap();

    let names: Vec<_> = diagram.tables.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"archive.orders"));
    assert!(names.contains(&"customers"));
    assert!(names.contains(&"order_items"));
    assert_eq!(names.len(), 5);

    let items = diagram.get_table("order_items").unwrap();
    assert_eq!(items.columns[0].role, Role::PrimaryKey);
    assert_eq!(items.columns[1].role, Role::PrimaryKey);
    assert_eq!(items.columns[2].role, Role::Plain);

    let orders = diagram.get_table("orders").unwrap();
    assert_eq!(orders.columns[1].role, Role::ForeignKey);
    assert_eq!(orders.indexes.len(), 1);
    assert_eq!(orders.indexes[0].field_type, "INDEX(customer_id)");
}

#[test]
fn test_include_order_and_relation_labels() {
    let dir = TempDir::new().unwrap();
    let url = create_shop_db(dir.path());
    let filter = Filter::new(&["orders", "customers"], &[], &[]).unwrap();

    let diagram = inspect_urls_with(&[url], None, &filter, Some(&no_pgpass(dir.path()))).unwrap();

    let names: Vec<_> = diagram.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["orders", "customers"]);
    assert_eq!(diagram.relations.len(), 1);
    assert_eq!(diagram.relations[0].from, "orders");
    assert_eq!(diagram.relations[0].to, "customers");
    assert_eq!(diagram.relations[0].by, "customer_id->id");
}

#[test]
fn test_relation_target_filter_uses_bare_name() {
    let dir = TempDir::new().unwrap();
    let url = create_shop_db(dir.path());
    let filter = Filter::new(&["order_items"], &[], &[]).unwrap();

    let diagram = inspect_urls_with(&[url], None, &filter, Some(&no_pgpass(dir.path()))).unwrap();
    assert_eq!(diagram.tables.len(), 1);
    assert!(diagram.relations.is_empty());
}

#[test]
fn test_explicit_schema_qualifies_every_table() {
    let dir = TempDir::new().unwrap();
    let url = create_shop_db(dir.path());

    let diagram = inspect_urls_with(
        &[url],
        Some("main"),
        &Filter::default(),
        Some(&no_pgpass(dir.path())),
    )
    .unwrap();

    assert!(diagram.tables.iter().all(|t| t.name.starts_with("main.")));
    assert!(diagram.get_table("archive.orders").is_none());
    let rel = diagram
        .relations
        .iter()
        .find(|r| r.from == "main.orders")
        .unwrap();
    assert_eq!(rel.to, "main.customers");
}

#[test]
fn test_include_fields_limits_columns() {
    let dir = TempDir::new().unwrap();
    let url = create_shop_db(dir.path());
    let filter = Filter::new(&["customers"], &[], &["id|name"]).unwrap();

    let diagram = inspect_urls_with(&[url], None, &filter, Some(&no_pgpass(dir.path()))).unwrap();
    let customers = diagram.get_table("customers").unwrap();
    let columns: Vec<_> = customers.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["id", "name"]);
}

#[test]
fn test_generate_dot_from_database_file() {
    let dir = TempDir::new().unwrap();
    let url = create_shop_db(dir.path());
    let settings = Settings {
        arguments: vec![url],
        exclude: vec!["audit_.*".to_string(), "archive\\..*".to_string()],
        include_indices: true,
        ..Default::default()
    };

    let output = generate(&settings, &Registry::new()).unwrap();
    assert!(output.contains("digraph G {"));
    assert!(!output.contains("audit_log"));
    assert!(output.contains("\"order_items\" -> \"orders\" [label=\"order_id->id\"]"));
    assert!(output.contains(">ix_orders_customer<"));
    assert_eq!(output, generate(&settings, &Registry::new()).unwrap());
}

#[test]
fn test_generate_plantuml_from_database_file() {
    let dir = TempDir::new().unwrap();
    let url = create_shop_db(dir.path());
    let settings = Settings {
        arguments: vec![url],
        include: vec!["customers".to_string()],
        format: OutputFormat::PlantUml,
        ..Default::default()
    };

    let output = generate(&settings, &Registry::new()).unwrap();
    assert!(output.starts_with("@startuml\n\nskinparam defaultFontName Courier\n\nClass customers {\n"));
    assert!(output.contains("    id    ★ INTEGER\n"));
    assert!(output.ends_with("@enduml\n"));
}

#[test]
fn test_unreadable_database_is_wrapped() {
    let dir = TempDir::new().unwrap();
    let bogus = dir.path().join("not-a-db.duckdb");
    std::fs::write(&bogus, "this is not a duckdb file").unwrap();
    let settings = Settings {
        arguments: vec![format!("duckdb:///{}", bogus.display())],
        ..Default::default()
    };

    let err = generate(&settings, &Registry::new()).unwrap_err();
    assert!(matches!(err, UmlError::Database { .. }));
    assert!(err.to_string().starts_with("cannot open database: duckdb://"));
}

#[test]
fn test_missing_database_file_is_not_created() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("typo.duckdb");
    let settings = Settings {
        arguments: vec![format!("duckdb:///{}", missing.display())],
        ..Default::default()
    };

    let err = generate(&settings, &Registry::new()).unwrap_err();
    assert!(matches!(err, UmlError::Database { .. }));
    assert!(err.to_string().contains("no such database file"));
    assert!(!missing.exists());
}

#[test]
fn test_duckdb_url_with_host_is_rejected() {
    let settings = Settings {
        arguments: vec!["duckdb://shop.duckdb".to_string()],
        ..Default::default()
    };

    let err = generate(&settings, &Registry::new()).unwrap_err();
    assert!(matches!(err, UmlError::Database { .. }));
    assert!(err.to_string().contains("duckdb urls take no host"));
}
