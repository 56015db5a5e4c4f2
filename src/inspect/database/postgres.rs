//! PostgreSQL catalog, read from `pg_catalog` with the blocking client.

use super::{Catalog, ReflectedForeignKey, TableName};
use crate::model::{ColumnSpec, IndexSpec};
use anyhow::{Context, Result};
use postgres::{Client, Config, NoTls};
use url::Url;

/// Resolves the (schema, table) parameter pair to a relation oid
const RELATION: &str = "to_regclass(quote_ident($1) || '.' || quote_ident($2))";

const TABLES_QUERY: &str = "SELECT n.nspname::text, c.relname::text \
     FROM pg_catalog.pg_class c \
     JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
     WHERE c.relkind IN ('r', 'p') AND NOT c.relispartition \
       AND n.nspname NOT IN ('pg_catalog', 'information_schema') \
       AND n.nspname NOT LIKE 'pg\\_toast%'";

/// Catalog of a live PostgreSQL database
pub struct PostgresCatalog {
    client: Client,
}

impl PostgresCatalog {
    pub fn connect(url: &Url) -> Result<Self> {
        let config = connection_config(url)?;
        let client = config
            .connect(NoTls)
            .context("Failed to connect to PostgreSQL")?;
        Ok(Self { client })
    }

    fn names(&mut self, sql: &str, table: &TableName) -> Result<Vec<String>> {
        let rows = self
            .client
            .query(sql, &[&table.schema, &table.name])
            .with_context(|| format!("Failed to query catalog for {}", table))?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }
}

/// Build client settings from url components (percent-decoded)
fn connection_config(url: &Url) -> Result<Config> {
    let decode = |s: &str| -> Result<String> {
        Ok(urlencoding::decode(s)
            .with_context(|| format!("invalid percent-encoding in '{}'", s))?
            .into_owned())
    };

    let mut config = Config::new();
    if let Some(host) = url.host_str() {
        config.host(&decode(host)?);
    }
    if let Some(port) = url.port() {
        config.port(port);
    }
    if !url.username().is_empty() {
        config.user(&decode(url.username())?);
    }
    if let Some(password) = url.password() {
        config.password(decode(password)?);
    }
    let database = url.path().trim_start_matches('/');
    if !database.is_empty() {
        config.dbname(&decode(database)?);
    }
    Ok(config)
}

impl Catalog for PostgresCatalog {
    fn default_schema(&mut self) -> Result<String> {
        let row = self
            .client
            .query_one("SELECT current_schema()::text", &[])
            .context("Failed to read current schema")?;
        let schema: Option<String> = row.get(0);
        Ok(schema.unwrap_or_else(|| "public".to_string()))
    }

    fn table_names(&mut self, schema: Option<&str>) -> Result<Vec<TableName>> {
        let rows = match schema {
            Some(schema) => {
                let sql = format!("{} AND n.nspname = $1 ORDER BY 1, 2", TABLES_QUERY);
                self.client.query(sql.as_str(), &[&schema])
            }
            None => {
                let sql = format!("{} ORDER BY 1, 2", TABLES_QUERY);
                self.client.query(sql.as_str(), &[])
            }
        }
        .context("Failed to list tables")?;

        Ok(rows
            .iter()
            .map(|row| TableName::new(row.get::<_, String>(0), row.get::<_, String>(1)))
            .collect())
    }

    fn columns(&mut self, table: &TableName) -> Result<Vec<ColumnSpec>> {
        let sql = format!(
            "SELECT a.attname::text, upper(pg_catalog.format_type(a.atttypid, a.atttypmod)) \
             FROM pg_catalog.pg_attribute a \
             WHERE a.attrelid = {} AND a.attnum > 0 AND NOT a.attisdropped \
             ORDER BY a.attnum",
            RELATION
        );
        let rows = self
            .client
            .query(sql.as_str(), &[&table.schema, &table.name])
            .with_context(|| format!("Failed to read columns of {}", table))?;

        Ok(rows
            .iter()
            .map(|row| ColumnSpec::new(row.get::<_, String>(0), row.get::<_, Option<String>>(1)))
            .collect())
    }

    fn primary_key(&mut self, table: &TableName) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT a.attname::text \
             FROM pg_catalog.pg_constraint con \
             CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord) \
             JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum \
             WHERE con.conrelid = {} AND con.contype = 'p' \
             ORDER BY k.ord",
            RELATION
        );
        self.names(&sql, table)
    }

    fn foreign_keys(&mut self, table: &TableName) -> Result<Vec<ReflectedForeignKey>> {
        let sql = format!(
            "SELECT rn.nspname::text, rc.relname::text, \
               ARRAY(SELECT a.attname::text \
                     FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord) \
                     JOIN pg_catalog.pg_attribute a \
                       ON a.attrelid = con.conrelid AND a.attnum = k.attnum \
                     ORDER BY k.ord), \
               ARRAY(SELECT a.attname::text \
                     FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord) \
                     JOIN pg_catalog.pg_attribute a \
                       ON a.attrelid = con.confrelid AND a.attnum = k.attnum \
                     ORDER BY k.ord) \
             FROM pg_catalog.pg_constraint con \
             JOIN pg_catalog.pg_class rc ON rc.oid = con.confrelid \
             JOIN pg_catalog.pg_namespace rn ON rn.oid = rc.relnamespace \
             WHERE con.conrelid = {} AND con.contype = 'f' \
             ORDER BY con.conname",
            RELATION
        );
        let rows = self
            .client
            .query(sql.as_str(), &[&table.schema, &table.name])
            .with_context(|| format!("Failed to read foreign keys of {}", table))?;

        Ok(rows
            .iter()
            .map(|row| ReflectedForeignKey {
                referred_schema: row.get(0),
                referred_table: row.get(1),
                columns: row.get(2),
                referred_columns: row.get(3),
            })
            .collect())
    }

    fn indexes(&mut self, table: &TableName) -> Result<Vec<IndexSpec>> {
        let sql = format!(
            "SELECT ic.relname::text, \
               ARRAY(SELECT COALESCE(a.attname::text, \
                                     pg_catalog.pg_get_indexdef(i.indexrelid, k.ord::int, true)) \
                     FROM unnest(i.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord) \
                     LEFT JOIN pg_catalog.pg_attribute a \
                       ON a.attrelid = i.indrelid AND a.attnum = k.attnum \
                     ORDER BY k.ord) \
             FROM pg_catalog.pg_index i \
             JOIN pg_catalog.pg_class ic ON ic.oid = i.indexrelid \
             WHERE i.indrelid = {} AND NOT i.indisprimary \
             ORDER BY ic.relname",
            RELATION
        );
        let rows = self
            .client
            .query(sql.as_str(), &[&table.schema, &table.name])
            .with_context(|| format!("Failed to read indexes of {}", table))?;

        Ok(rows
            .iter()
            .map(|row| IndexSpec {
                name: row.get(0),
                columns: row.get(1),
            })
            .collect())
    }
}
