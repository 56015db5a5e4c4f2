//! Include / exclude / include-fields filtering.
//!
//! Table and field patterns are regular expressions matched against the
//! whole name. Class names are compared literally. Selection with an include
//! list follows the include list's order, not the catalog's.

use crate::error::UmlError;
use ahash::AHashSet;
use regex::Regex;

/// A pattern that must match the entire name; without a regex it is a
/// literal name
#[derive(Debug, Clone)]
struct FullMatch {
    source: String,
    regex: Option<Regex>,
}

impl FullMatch {
    fn compile(option: &'static str, source: &str) -> Result<Self, UmlError> {
        let regex =
            Regex::new(&format!("^(?:{})$", source)).map_err(|e| UmlError::InvalidPattern {
                option,
                pattern: source.to_string(),
                source: e,
            })?;
        Ok(Self {
            source: source.to_string(),
            regex: Some(regex),
        })
    }

    fn literal(source: &str) -> Self {
        Self {
            source: source.to_string(),
            regex: None,
        }
    }

    fn matches(&self, name: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(name),
            None => self.source == name,
        }
    }
}

/// Split a whitespace-separated option value into patterns
pub fn split_patterns(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

/// Table and field filter shared by both introspectors
#[derive(Debug, Clone, Default)]
pub struct Filter {
    include: Vec<FullMatch>,
    exclude: Vec<FullMatch>,
    include_fields: Vec<FullMatch>,
}

impl Filter {
    /// Compile the three pattern lists. `include` and `exclude` are mutually
    /// exclusive.
    pub fn new<S: AsRef<str>>(
        include: &[S],
        exclude: &[S],
        include_fields: &[S],
    ) -> Result<Self, UmlError> {
        if !include.is_empty() && !exclude.is_empty() {
            return Err(UmlError::IncludeAndExclude);
        }

        let compile = |option: &'static str, patterns: &[S]| {
            patterns
                .iter()
                .map(|p| FullMatch::compile(option, p.as_ref()))
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self {
            include: compile("include", include)?,
            exclude: compile("exclude", exclude)?,
            include_fields: compile("include-fields", include_fields)?,
        })
    }

    /// Filter for declared class names: `include` and `exclude` hold literal
    /// names, `include_fields` stays a regex list.
    pub fn for_classes<S: AsRef<str>>(
        include: &[S],
        exclude: &[S],
        include_fields: &[S],
    ) -> Result<Self, UmlError> {
        if !include.is_empty() && !exclude.is_empty() {
            return Err(UmlError::IncludeAndExclude);
        }
        let literal = |names: &[S]| -> Vec<FullMatch> {
            names.iter().map(|n| FullMatch::literal(n.as_ref())).collect()
        };
        Ok(Self {
            include: literal(include),
            exclude: literal(exclude),
            ..Self::new(&[], &[], include_fields)?
        })
    }

    pub fn has_include(&self) -> bool {
        !self.include.is_empty()
    }

    /// Select table names. With an include list, names are returned in
    /// include-pattern order, each at most once. With an exclude list, names
    /// matching any exclude pattern are dropped and catalog order is kept.
    pub fn select_tables<'n>(&self, names: &'n [String]) -> Vec<&'n String> {
        if self.has_include() {
            let mut seen = AHashSet::new();
            let mut selected = Vec::new();
            for pattern in &self.include {
                for name in names {
                    if pattern.matches(name) && seen.insert(name.as_str()) {
                        selected.push(name);
                    }
                }
            }
            return selected;
        }

        names
            .iter()
            .filter(|name| !self.exclude.iter().any(|p| p.matches(name)))
            .collect()
    }

    /// Whether a single table name passes the include / exclude filter
    pub fn allows(&self, name: &str) -> bool {
        if self.has_include() && !self.include.iter().any(|p| p.matches(name)) {
            return false;
        }
        !self.exclude.iter().any(|p| p.matches(name))
    }

    /// Whether a column or index name passes `include_fields`
    pub fn keeps_field(&self, name: &str) -> bool {
        self.include_fields.is_empty() || self.include_fields.iter().any(|p| p.matches(name))
    }

    /// Select named items by exact membership in the include / exclude lists.
    ///
    /// Used for declared class names, where patterns are compared literally.
    /// With an include list the result follows the include list's order.
    pub fn select_exact<T>(&self, items: Vec<(String, T)>) -> Vec<(String, T)> {
        if self.has_include() {
            let mut slots: Vec<Option<(String, T)>> = items.into_iter().map(Some).collect();
            let mut selected = Vec::new();
            for pattern in &self.include {
                for slot in slots.iter_mut() {
                    if slot.as_ref().is_some_and(|(name, _)| pattern.source == *name) {
                        selected.extend(slot.take());
                    }
                }
            }
            return selected;
        }

        items
            .into_iter()
            .filter(|(name, _)| !self.exclude.iter().any(|p| p.source == *name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_include_and_exclude_conflict() {
        let err = Filter::new(&["a"], &["b"], &[]).unwrap_err();
        assert!(matches!(err, UmlError::IncludeAndExclude));
    }

    #[test]
    fn test_include_preserves_include_order() {
        let filter = Filter::new(&["orders", "customers"], &[], &[]).unwrap();
        let tables = names(&["customers", "orders", "products"]);
        let selected = filter.select_tables(&tables);
        assert_eq!(selected, vec!["orders", "customers"]);
    }

    #[test]
    fn test_include_emits_each_table_once() {
        let filter = Filter::new(&["order.*", "orders"], &[], &[]).unwrap();
        let tables = names(&["order_items", "orders"]);
        assert_eq!(filter.select_tables(&tables), vec!["order_items", "orders"]);
    }

    #[test]
    fn test_patterns_match_full_name() {
        let filter = Filter::new(&["user"], &[], &[]).unwrap();
        let tables = names(&["user", "users", "superuser"]);
        assert_eq!(filter.select_tables(&tables), vec!["user"]);
        assert!(!filter.allows("users"));
    }

    #[test]
    fn test_exclude_drops_any_match() {
        let filter = Filter::new(&[], &["audit_.*", "tmp"], &[]).unwrap();
        let tables = names(&["users", "audit_log", "tmp", "orders"]);
        assert_eq!(filter.select_tables(&tables), vec!["users", "orders"]);
        assert!(!filter.allows("audit_log"));
        assert!(filter.allows("orders"));
    }

    #[test]
    fn test_include_fields() {
        let filter = Filter::new::<&str>(&[], &[], &["id", ".*_id"]).unwrap();
        assert!(filter.keeps_field("id"));
        assert!(filter.keeps_field("customer_id"));
        assert!(!filter.keeps_field("email"));
        assert!(Filter::default().keeps_field("email"));
    }

    #[test]
    fn test_invalid_pattern_names_option() {
        let err = Filter::new::<&str>(&[], &[], &["("]).unwrap_err();
        assert!(err.to_string().contains("include-fields"));
    }

    #[test]
    fn test_select_exact_is_literal() {
        let filter = Filter::new(&["Order", "Customer"], &[], &[]).unwrap();
        let classes = vec![
            ("Customer".to_string(), 1),
            ("Order".to_string(), 2),
            ("OrderLine".to_string(), 3),
        ];
        let selected: Vec<_> = filter.select_exact(classes).into_iter().map(|c| c.1).collect();
        assert_eq!(selected, vec![2, 1]);

        let filter = Filter::new(&[], &["Order.*"], &[]).unwrap();
        let classes = vec![("Order".to_string(), 1), ("OrderLine".to_string(), 2)];
        assert_eq!(filter.select_exact(classes).len(), 2);
    }

    #[test]
    fn test_class_names_are_not_regexes() {
        let filter = Filter::for_classes::<&str>(&["Order(", "Customer"], &[], &[]).unwrap();
        let classes = vec![
            ("Customer".to_string(), 1),
            ("Order(".to_string(), 2),
            ("Orders".to_string(), 3),
        ];
        let selected: Vec<_> = filter.select_exact(classes).into_iter().map(|c| c.1).collect();
        assert_eq!(selected, vec![2, 1]);

        assert!(Filter::for_classes::<&str>(&[], &["[Audit"], &[]).is_ok());
        assert!(Filter::for_classes::<&str>(&[], &[], &["("]).is_err());
        assert!(matches!(
            Filter::for_classes(&["A"], &["B"], &[]),
            Err(UmlError::IncludeAndExclude)
        ));
    }

    #[test]
    fn test_split_patterns() {
        assert_eq!(split_patterns("  a  b\tc\n"), names(&["a", "b", "c"]));
        assert!(split_patterns("").is_empty());
    }
}
