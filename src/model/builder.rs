//! Common sink for the database and model introspectors.
//!
//! Both producers describe each table with the same raw specs; role
//! derivation, field filtering and relation labelling happen here once.

use super::{relation_label, Diagram, Field, Relation, Role, Table};
use crate::filter::Filter;
use ahash::AHashSet;

/// A reflected or declared column before role derivation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    /// `None` when the storage type could not be rendered
    pub type_name: Option<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, type_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            type_name,
        }
    }
}

/// A reflected or declared index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub columns: Vec<String>,
}

/// A foreign-key constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeySpec {
    /// Constrained columns in the owning table
    pub columns: Vec<String>,
    /// Referenced table name, schema-qualified when it has a schema
    pub referred_table: String,
    /// Referenced columns, pairwise with `columns`
    pub referred_columns: Vec<String>,
}

/// Accumulates tables and relations in output order
pub struct DiagramBuilder<'a> {
    filter: &'a Filter,
    diagram: Diagram,
}

impl<'a> DiagramBuilder<'a> {
    pub fn new(filter: &'a Filter) -> Self {
        Self {
            filter,
            diagram: Diagram::default(),
        }
    }

    /// Add a table. Roles are derived from `primary_key` and the union of all
    /// foreign-key column sets; `include_fields` drops columns and indexes.
    pub fn add_table(
        &mut self,
        name: impl Into<String>,
        columns: &[ColumnSpec],
        primary_key: &[String],
        foreign_keys: &[ForeignKeySpec],
        indexes: &[IndexSpec],
    ) {
        let pks: AHashSet<&str> = primary_key.iter().map(String::as_str).collect();
        let fks: AHashSet<&str> = foreign_keys
            .iter()
            .flat_map(|fk| fk.columns.iter().map(String::as_str))
            .collect();

        let columns = columns
            .iter()
            .filter(|col| self.filter.keeps_field(&col.name))
            .map(|col| {
                let role = Role::for_column(
                    pks.contains(col.name.as_str()),
                    fks.contains(col.name.as_str()),
                );
                Field::column(col.name.clone(), col.type_name.clone(), role)
            })
            .collect();

        let indexes = indexes
            .iter()
            .filter(|idx| self.filter.keeps_field(&idx.name))
            .map(|idx| Field::index(idx.name.clone(), &idx.columns))
            .collect();

        self.diagram.tables.push(Table {
            name: name.into(),
            columns,
            indexes,
        });
    }

    /// Add the edge for one foreign key. Constraints without column pairs
    /// produce no edge.
    pub fn add_relation(&mut self, from: &str, fk: &ForeignKeySpec) {
        let pairs: Vec<(&String, &String)> =
            fk.columns.iter().zip(fk.referred_columns.iter()).collect();
        if pairs.is_empty() {
            return;
        }

        self.diagram.relations.push(Relation {
            from: from.to_string(),
            to: fk.referred_table.clone(),
            by: relation_label(&pairs),
        });
    }

    pub fn finish(self) -> Diagram {
        self.diagram
    }
}
