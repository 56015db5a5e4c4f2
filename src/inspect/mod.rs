//! Schema introspection.
//!
//! Two independent producers feed the same [`DiagramBuilder`]:
//! - `database`: reflects a live database through its system catalog
//! - `models`: reads table mappings from declared model classes
//!
//! [`DiagramBuilder`]: crate::model::DiagramBuilder

pub mod database;
pub mod models;

pub use database::{connect, inspect_urls, inspect_urls_with, Catalog, TableName};
pub use models::{
    inspect_modules, Class, Declared, FileLoader, MappedTable, ModelModule, ModuleLoader, Registry,
};
