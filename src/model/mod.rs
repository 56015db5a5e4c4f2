//! Unified object model shared by both introspectors and all renderers.
//!
//! This module provides:
//! - `Table`, `Field`, `Relation` and `Diagram`, the source-independent shape
//!   every diagram is rendered from
//! - `Role`, the key marker shown next to each field
//! - `DiagramBuilder`, the single sink both introspection paths write into

mod builder;

pub use builder::{ColumnSpec, DiagramBuilder, ForeignKeySpec, IndexSpec};

use std::fmt;

/// Type string used when a column's storage type cannot be rendered
pub const UNKNOWN_TYPE: &str = "unknown";

/// Key marker of a table field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Column is part of the primary key
    PrimaryKey,
    /// Column is constrained by a foreign key (and not part of the primary key)
    ForeignKey,
    /// Ordinary column
    Plain,
    /// Row describes an index
    Index,
}

impl Role {
    /// Derive a column role from key membership. Primary key wins.
    pub fn for_column(is_primary_key: bool, is_foreign_key: bool) -> Self {
        if is_primary_key {
            Role::PrimaryKey
        } else if is_foreign_key {
            Role::ForeignKey
        } else {
            Role::Plain
        }
    }

    /// Marker glyph rendered in diagrams
    pub fn marker(self) -> &'static str {
        match self {
            Role::PrimaryKey => "★",
            Role::ForeignKey => "☆",
            Role::Plain => "◦",
            Role::Index => "»",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// One row of a table node: a column or an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Column or index name
    pub name: String,
    /// Storage type, or `INDEX(...)` for indexes
    pub field_type: String,
    /// Key marker
    pub role: Role,
}

impl Field {
    pub fn column(name: impl Into<String>, field_type: Option<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
            role,
        }
    }

    pub fn index<S: AsRef<str>>(name: impl Into<String>, columns: &[S]) -> Self {
        let columns: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
        Self {
            name: name.into(),
            field_type: format!("INDEX({})", columns.join(", ")),
            role: Role::Index,
        }
    }
}

/// A table as it appears in the diagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Display name, schema-qualified when applicable
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<Field>,
    /// Indexes in catalog order
    pub indexes: Vec<Field>,
}

impl Table {
    /// Rows to render: columns first, then indexes when requested
    pub fn rows(&self, include_indices: bool) -> impl Iterator<Item = &Field> {
        let indexes: &[Field] = if include_indices { &self.indexes } else { &[] };
        self.columns.iter().chain(indexes.iter())
    }
}

/// A foreign-key edge between two tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Table holding the foreign key
    pub from: String,
    /// Referenced table, schema-qualified when it has a schema
    pub to: String,
    /// Edge label, see [`relation_label`]
    pub by: String,
}

/// Build a relation label from (constrained, referred) column pairs.
///
/// Pairs with equal names collapse to the name, others render as `src->dst`.
/// Pairs are joined with `,\n` (a literal backslash-n, the line break escape
/// understood by both DOT and PlantUML labels).
pub fn relation_label<A: AsRef<str>, B: AsRef<str>>(pairs: &[(A, B)]) -> String {
    pairs
        .iter()
        .map(|(source, target)| {
            let (source, target) = (source.as_ref(), target.as_ref());
            if source == target {
                source.to_string()
            } else {
                format!("{}->{}", source, target)
            }
        })
        .collect::<Vec<_>>()
        .join(",\\n")
}

/// The complete diagram: tables plus relations, in output order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagram {
    pub tables: Vec<Table>,
    pub relations: Vec<Relation>,
}

impl Diagram {
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Get a table by exact name
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}
