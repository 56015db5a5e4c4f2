//! Model introspection: diagrams from declared model classes.
//!
//! A model module is a named set of declared classes. Each class may expose
//! a table mapping; classes without one (mixins, helpers, plain value types)
//! are skipped. Modules are resolved by a [`ModuleLoader`], either from an
//! in-process [`Registry`] or from model files on disk ([`FileLoader`]).

mod file;

pub use file::FileLoader;

use crate::filter::Filter;
use crate::model::{ColumnSpec, Diagram, DiagramBuilder, ForeignKeySpec, IndexSpec};
use ahash::AHashMap;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A declared type that may be mapped to a table
pub trait Declared {
    fn class_name(&self) -> &str;

    /// The mapped table, or `None` when the type has no table mapping
    fn mapped_table(&self) -> Option<&MappedTable>;
}

/// Declared column of a mapped table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredColumn {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    /// Column-level primary key flag, merged with the table's `primary_key`
    #[serde(default)]
    pub primary_key: bool,
}

/// Declared foreign-key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredForeignKey {
    pub columns: Vec<String>,
    /// Referenced table, `schema.table` when it lives in another schema
    pub references: String,
    pub referred_columns: Vec<String>,
}

/// Declared index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredIndex {
    pub name: String,
    pub columns: Vec<String>,
}

/// Table mapping metadata of a declared class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedTable {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<DeclaredColumn>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<DeclaredForeignKey>,
    #[serde(default)]
    pub indexes: Vec<DeclaredIndex>,
}

impl MappedTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn column(mut self, name: &str, type_name: &str) -> Self {
        self.columns.push(DeclaredColumn {
            name: name.to_string(),
            type_name: Some(type_name.to_string()),
            primary_key: false,
        });
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn foreign_key(mut self, columns: &[&str], references: &str, referred: &[&str]) -> Self {
        self.foreign_keys.push(DeclaredForeignKey {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            references: references.to_string(),
            referred_columns: referred.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn index(mut self, name: &str, columns: &[&str]) -> Self {
        self.indexes.push(DeclaredIndex {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// Primary key columns: the table-level list plus flagged columns
    fn primary_key_columns(&self) -> Vec<String> {
        let mut pks = self.primary_key.clone();
        for col in self.columns.iter().filter(|c| c.primary_key) {
            if !pks.contains(&col.name) {
                pks.push(col.name.clone());
            }
        }
        pks
    }
}

/// A declared class, as written in Rust or read from a model file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    #[serde(default)]
    pub table: Option<MappedTable>,
}

impl Class {
    pub fn mapped(name: impl Into<String>, table: MappedTable) -> Self {
        Self {
            name: name.into(),
            table: Some(table),
        }
    }

    pub fn unmapped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
        }
    }
}

impl Declared for Class {
    fn class_name(&self) -> &str {
        &self.name
    }

    fn mapped_table(&self) -> Option<&MappedTable> {
        self.table.as_ref()
    }
}

/// A named collection of declared classes
pub struct ModelModule {
    name: String,
    classes: Vec<Box<dyn Declared>>,
}

impl ModelModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: Vec::new(),
        }
    }

    pub fn with(mut self, class: impl Declared + 'static) -> Self {
        self.classes.push(Box::new(class));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes sorted by name
    fn into_members(self) -> Vec<(String, Box<dyn Declared>)> {
        let mut members: Vec<_> = self
            .classes
            .into_iter()
            .map(|c| (c.class_name().to_string(), c))
            .collect();
        members.sort_by(|a, b| a.0.cmp(&b.0));
        members
    }
}

/// Resolves a module name to its declared classes
pub trait ModuleLoader {
    fn load(&self, name: &str) -> Result<ModelModule>;
}

/// Modules compiled into the program, registered by name
#[derive(Default)]
pub struct Registry {
    modules: AHashMap<String, fn() -> ModelModule>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, module: fn() -> ModelModule) -> &mut Self {
        self.modules.insert(name.into(), module);
        self
    }
}

impl ModuleLoader for Registry {
    fn load(&self, name: &str) -> Result<ModelModule> {
        self.modules
            .get(name)
            .map(|module| module())
            .ok_or_else(|| anyhow!("no model module named '{}'", name))
    }
}

/// Inspect model modules.
///
/// Class names are filtered by exact membership in the include / exclude
/// lists. Relations are emitted for every foreign key of a selected class,
/// whether or not the referenced table was selected.
pub fn inspect_modules<S: AsRef<str>>(
    modules: &[S],
    loader: &dyn ModuleLoader,
    filter: &Filter,
) -> Result<Diagram> {
    let mut classes = Vec::new();
    for name in modules {
        let module = loader.load(name.as_ref())?;
        debug!(module = module.name(), classes = module.len(), "loaded");
        classes.extend(module.into_members());
    }

    let mut builder = DiagramBuilder::new(filter);

    for (name, class) in filter.select_exact(classes) {
        let Some(table) = class.mapped_table() else {
            debug!(class = %name, "no table mapping, skipped");
            continue;
        };

        let columns: Vec<ColumnSpec> = table
            .columns
            .iter()
            .map(|c| ColumnSpec::new(c.name.clone(), c.type_name.clone()))
            .collect();
        let foreign_keys: Vec<ForeignKeySpec> = table
            .foreign_keys
            .iter()
            .map(|fk| ForeignKeySpec {
                columns: fk.columns.clone(),
                referred_table: fk.references.clone(),
                referred_columns: fk.referred_columns.clone(),
            })
            .collect();
        let indexes: Vec<IndexSpec> = table
            .indexes
            .iter()
            .map(|idx| IndexSpec {
                name: idx.name.clone(),
                columns: idx.columns.clone(),
            })
            .collect();

        builder.add_table(
            table.name.clone(),
            &columns,
            &table.primary_key_columns(),
            &foreign_keys,
            &indexes,
        );
        for fk in &foreign_keys {
            builder.add_relation(&table.name, fk);
        }
    }

    Ok(builder.finish())
}
