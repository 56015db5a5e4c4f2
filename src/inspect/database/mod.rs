//! Live database introspection.
//!
//! Each url is opened through a dialect-specific [`Catalog`], its tables are
//! filtered, and every surviving table is described to the diagram builder.
//!
//! Supported url schemes (an optional `+driver` suffix is ignored):
//!
//! | Scheme | Backend |
//! |--------|---------|
//! | `postgres`, `postgresql` | PostgreSQL system catalog |
//! | `duckdb` | existing DuckDB file, read-only (`duckdb:///rel.duckdb`, `duckdb:////abs.duckdb`) or `duckdb://` in memory |

mod duckdb;
mod postgres;

pub use self::duckdb::DuckDbCatalog;
pub use self::postgres::PostgresCatalog;

use crate::filter::Filter;
use crate::model::{ColumnSpec, Diagram, DiagramBuilder, ForeignKeySpec, IndexSpec};
use crate::pgpass::{resolve_password, PgPass};
use crate::source::redact;
use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::Path;
use tracing::debug;
use url::Url;

/// A table as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    pub schema: String,
    pub name: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A foreign key as reflected from the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedForeignKey {
    pub columns: Vec<String>,
    pub referred_schema: String,
    pub referred_table: String,
    pub referred_columns: Vec<String>,
}

/// Read access to a database's schema metadata
pub trait Catalog {
    /// Schema unqualified names resolve to (`public`, `main`, ...)
    fn default_schema(&mut self) -> Result<String>;

    /// Base tables of `schema`, or of every user schema when `None`
    fn table_names(&mut self, schema: Option<&str>) -> Result<Vec<TableName>>;

    /// Columns in ordinal order. A `None` type means it could not be rendered.
    fn columns(&mut self, table: &TableName) -> Result<Vec<ColumnSpec>>;

    /// Primary key columns in key order
    fn primary_key(&mut self, table: &TableName) -> Result<Vec<String>>;

    fn foreign_keys(&mut self, table: &TableName) -> Result<Vec<ReflectedForeignKey>>;

    /// Secondary indexes; the primary key's own index is not listed
    fn indexes(&mut self, table: &TableName) -> Result<Vec<IndexSpec>>;
}

/// Dialect name of a url scheme, without any `+driver` suffix
fn dialect(scheme: &str) -> &str {
    scheme.split('+').next().unwrap_or(scheme)
}

/// Open a catalog for a connection url
pub fn connect(url: &Url) -> Result<Box<dyn Catalog>> {
    match dialect(url.scheme()) {
        "postgres" | "postgresql" => Ok(Box::new(PostgresCatalog::connect(url)?)),
        "duckdb" => Ok(Box::new(DuckDbCatalog::open(url)?)),
        other => bail!("unsupported database dialect '{}'", other),
    }
}

/// Inspect databases, reading missing passwords from the default credential
/// file location.
pub fn inspect_urls(urls: &[String], schema: Option<&str>, filter: &Filter) -> Result<Diagram> {
    inspect_urls_with(urls, schema, filter, PgPass::default_path().as_deref())
}

/// Inspect databases with an explicit credential file
pub fn inspect_urls_with(
    urls: &[String],
    schema: Option<&str>,
    filter: &Filter,
    pgpass: Option<&Path>,
) -> Result<Diagram> {
    let mut builder = DiagramBuilder::new(filter);

    for raw in urls {
        let mut url =
            Url::parse(raw).with_context(|| format!("invalid database url '{}'", redact(raw)))?;
        resolve_password(&mut url, pgpass);

        let mut catalog = connect(&url)?;
        inspect_catalog(catalog.as_mut(), schema, filter, &mut builder)
            .with_context(|| format!("reflection failed for {}", redact(url.as_str())))?;
    }

    Ok(builder.finish())
}

/// Describe every selected table of one catalog to the builder
pub fn inspect_catalog(
    catalog: &mut dyn Catalog,
    schema: Option<&str>,
    filter: &Filter,
    builder: &mut DiagramBuilder<'_>,
) -> Result<()> {
    let default_schema = catalog.default_schema()?;
    let qualify = |table_schema: &str, name: &str| {
        if schema.is_some() || table_schema != default_schema {
            format!("{}.{}", table_schema, name)
        } else {
            name.to_string()
        }
    };

    let tables = catalog.table_names(schema)?;
    let names: Vec<String> = tables.iter().map(|t| qualify(&t.schema, &t.name)).collect();

    for name in filter.select_tables(&names) {
        let Some(table) = names
            .iter()
            .position(|n| n == name)
            .map(|i| &tables[i])
        else {
            continue;
        };
        debug!(table = %name, "reflecting");

        let primary_key = catalog.primary_key(table)?;
        let reflected = catalog.foreign_keys(table)?;
        // The target filter sees the bare referenced table name
        let targets: Vec<String> = reflected.iter().map(|fk| fk.referred_table.clone()).collect();
        let foreign_keys: Vec<ForeignKeySpec> = reflected
            .into_iter()
            .map(|fk| ForeignKeySpec {
                referred_table: qualify(&fk.referred_schema, &fk.referred_table),
                columns: fk.columns,
                referred_columns: fk.referred_columns,
            })
            .collect();
        let columns = catalog.columns(table)?;
        let indexes = catalog.indexes(table)?;

        builder.add_table(name.clone(), &columns, &primary_key, &foreign_keys, &indexes);

        for (fk, target) in foreign_keys.iter().zip(&targets) {
            if filter.allows(target) {
                builder.add_relation(name, fk);
            }
        }
    }

    Ok(())
}
