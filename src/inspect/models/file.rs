//! Model modules read from YAML or JSON files.
//!
//! A dotted module name `app.models` resolves to `app/models.yaml`,
//! `app/models.yml` or `app/models.json` under the first search path that has
//! one. A name that is itself an existing file path is loaded directly.
//!
//! ```yaml
//! classes:
//!   - name: Order
//!     table:
//!       name: orders
//!       columns:
//!         - { name: id, type: INTEGER, primary_key: true }
//!         - { name: customer_id, type: INTEGER }
//!       foreign_keys:
//!         - { columns: [customer_id], references: customers, referred_columns: [id] }
//!   - name: TimestampMixin
//! ```

use super::{Class, ModelModule, ModuleLoader};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModuleFile {
    classes: Vec<Class>,
}

/// Loads model modules from files under a list of search paths
#[derive(Debug, Clone)]
pub struct FileLoader {
    search_paths: Vec<PathBuf>,
}

impl Default for FileLoader {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from(".")],
        }
    }
}

impl FileLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        if search_paths.is_empty() {
            return Self::default();
        }
        Self { search_paths }
    }

    /// Locate the file backing a module name
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }

        let relative = name.replace('.', "/");
        self.search_paths.iter().find_map(|dir| {
            EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{}.{}", relative, ext)))
                .find(|candidate| candidate.is_file())
        })
    }

    fn parse(path: &Path) -> Result<ModuleFile> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON model file {}", path.display()))?
        } else {
            serde_yaml_ng::from_str(&content)
                .with_context(|| format!("Failed to parse YAML model file {}", path.display()))?
        };
        Ok(parsed)
    }
}

impl ModuleLoader for FileLoader {
    fn load(&self, name: &str) -> Result<ModelModule> {
        let Some(path) = self.resolve(name) else {
            bail!(
                "no model module named '{}' (searched: {})",
                name,
                self.search_paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        };

        let file = Self::parse(&path)?;
        Ok(file
            .classes
            .into_iter()
            .fold(ModelModule::new(name), ModelModule::with))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::inspect::models::inspect_modules;
    use tempfile::TempDir;

    const SHOP_YAML: &str = r#"
classes:
  - name: Order
    table:
      name: orders
      columns:
        - { name: id, type: INTEGER, primary_key: true }
        - { name: customer_id, type: INTEGER }
        - { name: note }
      foreign_keys:
        - { columns: [customer_id], references: customers, referred_columns: [id] }
  - name: Customer
    table:
      name: customers
      columns:
        - { name: id, type: INTEGER }
      primary_key: [id]
  - name: TimestampMixin
"#;

    #[test]
    fn test_dotted_name_resolves_under_search_path() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("app/models.yaml"), SHOP_YAML).unwrap();

        let loader = FileLoader::new(vec![dir.path().to_path_buf()]);
        assert_eq!(
            loader.resolve("app.models"),
            Some(dir.path().join("app/models.yaml"))
        );

        let module = loader.load("app.models").unwrap();
        assert_eq!(module.name(), "app.models");
        assert_eq!(module.len(), 3);
    }

    #[test]
    fn test_yaml_module_inspection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shop.yml");
        fs::write(&path, SHOP_YAML).unwrap();

        let loader = FileLoader::default();
        let diagram = inspect_modules(
            &[path.to_str().unwrap()],
            &loader,
            &Filter::default(),
        )
        .unwrap();

        let names: Vec<_> = diagram.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["customers", "orders"]);
        let orders = diagram.get_table("orders").unwrap();
        assert_eq!(orders.columns[2].field_type, "unknown");
        assert_eq!(diagram.relations[0].by, "customer_id->id");
    }

    #[test]
    fn test_json_module() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("catalog.json"),
            r#"{"classes": [{"name": "Product", "table": {"name": "products",
                "columns": [{"name": "sku", "type": "TEXT"}], "primary_key": ["sku"]}}]}"#,
        )
        .unwrap();

        let loader = FileLoader::new(vec![dir.path().to_path_buf()]);
        let module = loader.load("catalog").unwrap();
        assert_eq!(module.len(), 1);
    }

    #[test]
    fn test_missing_module() {
        let dir = TempDir::new().unwrap();
        let loader = FileLoader::new(vec![dir.path().to_path_buf()]);
        let err = loader.load("app.missing").err().unwrap();
        assert!(err.to_string().contains("no model module named 'app.missing'"));
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.yaml"), "classes: [ {name: ").unwrap();
        let loader = FileLoader::new(vec![dir.path().to_path_buf()]);
        assert!(loader.load("broken").is_err());
    }
}
