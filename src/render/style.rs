//! DOT attribute sets and their merging.
//!
//! Five independent attribute maps style a diagram: `graph`, `node` and
//! `edge` statements, and the HTML-like `table` and `td` elements of each
//! table node. Every map keeps insertion order so rendered attribute lists
//! are stable.
//!
//! A key of the form `attr.TABLENAME` applies to that table only (matched
//! case-insensitively); a plain `attr` applies to every table.

use std::fmt;

const FONTNAME: &str = "\"DejaVu Sans Mono\"";
const FONTSIZE: &str = "10";

/// Ordered attribute map. Re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrMap {
    entries: Vec<(String, String)>,
}

impl AttrMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an RFC 3986 query string, e.g. `bgcolor=transparent&rankdir=RL`.
    /// Pairs with a blank key or value are dropped.
    pub fn from_query(query: &str) -> Self {
        url::form_urlencoded::parse(query.as_bytes())
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Merge another map over this one, key by key
    pub fn merge(&mut self, other: &AttrMap) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttrMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AttrMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// `key=value` pairs separated by single spaces
impl fmt::Display for AttrMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        Ok(())
    }
}

/// Which element an attribute map styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Graph,
    Node,
    Edge,
    Table,
    Td,
}

impl AttrKind {
    pub const ALL: [AttrKind; 5] = [
        AttrKind::Graph,
        AttrKind::Node,
        AttrKind::Edge,
        AttrKind::Table,
        AttrKind::Td,
    ];

    /// HTML-like label attributes: upper-case keys, always-quoted values
    pub fn is_html(self) -> bool {
        matches!(self, AttrKind::Table | AttrKind::Td)
    }

    pub fn name(self) -> &'static str {
        match self {
            AttrKind::Graph => "graph",
            AttrKind::Node => "node",
            AttrKind::Edge => "edge",
            AttrKind::Table => "table",
            AttrKind::Td => "td",
        }
    }
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The five attribute maps of a DOT diagram
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotStyle {
    pub graph: AttrMap,
    pub node: AttrMap,
    pub edge: AttrMap,
    pub table: AttrMap,
    pub td: AttrMap,
}

impl DotStyle {
    /// Built-in defaults
    pub fn defaults() -> Self {
        let font = [("fontname", FONTNAME), ("fontsize", FONTSIZE)];
        Self {
            graph: font.into_iter().chain([("pad", "0")]).collect(),
            node: font
                .into_iter()
                .chain([("shape", "none"), ("width", "0"), ("height", "0"), ("margin", "0")])
                .collect(),
            edge: font
                .into_iter()
                .chain([("arrowhead", "ediamond"), ("arrowtail", "open")])
                .collect(),
            table: [
                ("BGCOLOR", "\"#fefece\""),
                ("BORDER", "\"2\""),
                ("COLOR", "\"#a80036\""),
                ("CELLBORDER", "\"0\""),
                ("CELLSPACING", "\"0\""),
            ]
            .into_iter()
            .collect(),
            td: [("ALIGN", "\"LEFT\""), ("BORDER", "\"0\"")]
                .into_iter()
                .collect(),
        }
    }

    /// Defaults with caller attributes merged over them
    pub fn with_overrides(overrides: &DotStyle) -> Self {
        let mut style = Self::defaults();
        for kind in AttrKind::ALL {
            let target = style.get_mut(kind);
            for (k, v) in overrides.get(kind).iter() {
                if kind.is_html() {
                    target.insert(k.to_uppercase(), format!("\"{}\"", v.trim_matches('"')));
                } else {
                    target.insert(k, v);
                }
            }
        }
        style
    }

    pub fn get(&self, kind: AttrKind) -> &AttrMap {
        match kind {
            AttrKind::Graph => &self.graph,
            AttrKind::Node => &self.node,
            AttrKind::Edge => &self.edge,
            AttrKind::Table => &self.table,
            AttrKind::Td => &self.td,
        }
    }

    pub fn get_mut(&mut self, kind: AttrKind) -> &mut AttrMap {
        match kind {
            AttrKind::Graph => &mut self.graph,
            AttrKind::Node => &mut self.node,
            AttrKind::Edge => &mut self.edge,
            AttrKind::Table => &mut self.table,
            AttrKind::Td => &mut self.td,
        }
    }

    /// Effective attributes of one element. Plain keys apply everywhere,
    /// `attr.TABLE` keys override `attr` for the named table only and are
    /// ignored when no table is given.
    pub fn resolve(&self, kind: AttrKind, table: Option<&str>) -> AttrMap {
        let map = self.get(kind);
        let mut resolved: AttrMap = map.iter().filter(|(k, _)| !k.contains('.')).collect();

        if let Some(table) = table {
            for (k, v) in map.iter() {
                if let Some((attr, target)) = k.split_once('.') {
                    if target.eq_ignore_ascii_case(table) {
                        resolved.insert(attr, v);
                    }
                }
            }
        }
        resolved
    }
}
