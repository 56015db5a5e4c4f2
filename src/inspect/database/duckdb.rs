//! DuckDB catalog, read through the `duckdb_*()` metadata table functions.

use super::{Catalog, ReflectedForeignKey, TableName};
use crate::model::{ColumnSpec, IndexSpec};
use anyhow::{bail, Context, Result};
use duckdb::{params, AccessMode, Config, Connection};
use std::path::PathBuf;
use url::Url;

const TABLES_QUERY: &str = "SELECT schema_name, table_name FROM duckdb_tables() \
     WHERE database_name = current_database() AND NOT internal AND NOT temporary";

const COLUMNS_QUERY: &str = "SELECT column_name, data_type FROM duckdb_columns() \
     WHERE database_name = current_database() AND schema_name = ? AND table_name = ? \
     ORDER BY column_index";

// Key column lists are flattened with list_aggr so rows stay scalar
const CONSTRAINTS_QUERY: &str = "SELECT constraint_type, \
       list_aggr(constraint_column_names, 'string_agg', ','), \
       referenced_table, \
       list_aggr(referenced_column_names, 'string_agg', ',') \
     FROM duckdb_constraints() \
     WHERE database_name = current_database() AND schema_name = ? AND table_name = ? \
       AND constraint_type IN ('PRIMARY KEY', 'FOREIGN KEY') \
     ORDER BY constraint_index";

const INDEXES_QUERY: &str = "SELECT index_name, sql FROM duckdb_indexes() \
     WHERE database_name = current_database() AND schema_name = ? AND table_name = ? \
     ORDER BY index_name";

/// Catalog of a DuckDB database file (or an in-memory database)
pub struct DuckDbCatalog {
    conn: Connection,
}

/// One PRIMARY KEY or FOREIGN KEY row of `duckdb_constraints()`
struct ConstraintRow {
    constraint_type: String,
    columns: Vec<String>,
    referenced_table: Option<String>,
    referenced_columns: Vec<String>,
}

impl DuckDbCatalog {
    /// Open the database a `duckdb:` url names, read-only.
    ///
    /// `duckdb:///shop.db` is relative to the working directory and
    /// `duckdb:////srv/shop.db` is absolute. An empty path or `:memory:`
    /// opens an in-memory database. Missing files are an error, never created.
    pub fn open(url: &Url) -> Result<Self> {
        let conn = match database_path(url)? {
            None => Connection::open_in_memory()
                .context("Failed to create in-memory DuckDB database")?,
            Some(path) => {
                if !path.is_file() {
                    bail!("no such database file: {}", path.display());
                }
                let config = Config::default().access_mode(AccessMode::ReadOnly)?;
                Connection::open_with_flags(&path, config).with_context(|| {
                    format!("Failed to open DuckDB database {}", path.display())
                })?
            }
        };
        Ok(Self { conn })
    }

    /// Wrap an already open connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn constraints(&self, table: &TableName) -> Result<Vec<ConstraintRow>> {
        let mut stmt = self.conn.prepare(CONSTRAINTS_QUERY)?;
        let rows = stmt
            .query_map(params![table.schema, table.name], |row| {
                Ok(ConstraintRow {
                    constraint_type: row.get(0)?,
                    columns: split_list(row.get(1)?),
                    referenced_table: row.get(2)?,
                    referenced_columns: split_list(row.get(3)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read constraints of {}", table))?;
        Ok(rows)
    }
}

fn split_list(joined: Option<String>) -> Vec<String> {
    joined
        .map(|s| s.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

impl Catalog for DuckDbCatalog {
    fn default_schema(&mut self) -> Result<String> {
        let schema: Option<String> = self
            .conn
            .query_row("SELECT current_schema()", [], |row| row.get(0))
            .context("Failed to read current schema")?;
        Ok(schema.unwrap_or_else(|| "main".to_string()))
    }

    fn table_names(&mut self, schema: Option<&str>) -> Result<Vec<TableName>> {
        let map_row = |row: &duckdb::Row<'_>| {
            Ok(TableName::new(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        };

        let tables = match schema {
            Some(schema) => {
                let sql = format!(
                    "{} AND schema_name = ? ORDER BY schema_name, table_name",
                    TABLES_QUERY
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map(params![schema], map_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let sql = format!("{} ORDER BY schema_name, table_name", TABLES_QUERY);
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map([], map_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(tables)
    }

    fn columns(&mut self, table: &TableName) -> Result<Vec<ColumnSpec>> {
        let mut stmt = self.conn.prepare(COLUMNS_QUERY)?;
        let columns = stmt
            .query_map(params![table.schema, table.name], |row| {
                Ok(ColumnSpec::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read columns of {}", table))?;
        Ok(columns)
    }

    fn primary_key(&mut self, table: &TableName) -> Result<Vec<String>> {
        Ok(self
            .constraints(table)?
            .into_iter()
            .find(|c| c.constraint_type == "PRIMARY KEY")
            .map(|c| c.columns)
            .unwrap_or_default())
    }

    fn foreign_keys(&mut self, table: &TableName) -> Result<Vec<ReflectedForeignKey>> {
        Ok(self
            .constraints(table)?
            .into_iter()
            .filter(|c| c.constraint_type == "FOREIGN KEY")
            .filter_map(|c| {
                Some(ReflectedForeignKey {
                    columns: c.columns,
                    // DuckDB foreign keys cannot leave their schema
                    referred_schema: table.schema.clone(),
                    referred_table: c.referenced_table?,
                    referred_columns: c.referenced_columns,
                })
            })
            .collect())
    }

    fn indexes(&mut self, table: &TableName) -> Result<Vec<IndexSpec>> {
        let mut stmt = self.conn.prepare(INDEXES_QUERY)?;
        let indexes = stmt
            .query_map(params![table.schema, table.name], |row| {
                let sql: Option<String> = row.get(1)?;
                Ok(IndexSpec {
                    name: row.get(0)?,
                    columns: sql.as_deref().map(index_columns).unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read indexes of {}", table))?;
        Ok(indexes)
    }
}

/// Extract the key expressions from a `CREATE INDEX ... ON t (a, b)` statement
pub(crate) fn index_columns(sql: &str) -> Vec<String> {
    let upper = sql.to_ascii_uppercase();
    let Some(on) = upper.find(" ON ") else {
        return Vec::new();
    };
    let Some(open) = sql[on..].find('(').map(|i| on + i) else {
        return Vec::new();
    };

    let mut columns = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in sql[open + 1..].chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' if depth == 0 => break,
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => columns.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    columns.push(current);

    columns
        .into_iter()
        .map(|c| c.trim().trim_matches('"').to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// File named by a `duckdb:` url, `None` for an in-memory database
fn database_path(url: &Url) -> Result<Option<PathBuf>> {
    if let Some(host) = url.host_str().filter(|h| !h.is_empty()) {
        bail!(
            "duckdb urls take no host (got {:?}); use duckdb:///relative.db or duckdb:////absolute.db",
            host
        );
    }
    let decoded = urlencoding::decode(url.path()).context("database path is not valid UTF-8")?;
    let path = decoded.strip_prefix('/').unwrap_or(&*decoded);
    if path.is_empty() || path == ":memory:" {
        return Ok(None);
    }
    Ok(Some(PathBuf::from(path)))
}
