//! Option layering: built-in defaults, a YAML config file, then the CLI.
//!
//! ```yaml
//! arguments: [postgresql://alice@localhost/shop]
//! schema: sales
//! include: orders customers
//! include_indices: true
//! render: dot
//! dot_graph: rankdir=LR
//! dot_table: bgcolor.customers=yellow
//! ```

use crate::error::UmlError;
use crate::filter::{split_patterns, Filter};
use crate::render::{AttrKind, AttrMap, DotStyle, OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Pattern list given as one whitespace-separated string or as a list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Patterns {
    Text(String),
    List(Vec<String>),
}

impl Patterns {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Patterns::Text(text) => split_patterns(text),
            Patterns::List(list) => list.iter().flat_map(|p| split_patterns(p)).collect(),
        }
    }
}

/// One layer of options. Unset fields leave earlier layers untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layer {
    pub arguments: Option<Vec<String>>,
    pub schema: Option<String>,
    pub include: Option<Patterns>,
    pub exclude: Option<Patterns>,
    pub include_fields: Option<Patterns>,
    pub include_indices: Option<bool>,
    pub render: Option<OutputFormat>,
    pub content: Option<String>,
    pub dot_graph: Option<String>,
    pub dot_node: Option<String>,
    pub dot_edge: Option<String>,
    pub dot_table: Option<String>,
    pub dot_td: Option<String>,
}

impl Layer {
    /// Read a layer from a YAML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(content)?)
    }

    fn style_query(&self, kind: AttrKind) -> Option<&str> {
        match kind {
            AttrKind::Graph => self.dot_graph.as_deref(),
            AttrKind::Node => self.dot_node.as_deref(),
            AttrKind::Edge => self.dot_edge.as_deref(),
            AttrKind::Table => self.dot_table.as_deref(),
            AttrKind::Td => self.dot_td.as_deref(),
        }
    }
}

/// Fully resolved options for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub arguments: Vec<String>,
    pub schema: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub include_fields: Vec<String>,
    pub include_indices: bool,
    pub format: OutputFormat,
    pub content: String,
    /// Caller attributes only; built-in defaults are applied by [`Settings::style`]
    pub style_overrides: DotStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arguments: Vec::new(),
            schema: None,
            include: Vec::new(),
            exclude: Vec::new(),
            include_fields: Vec::new(),
            include_indices: false,
            format: OutputFormat::Dot,
            content: String::new(),
            style_overrides: DotStyle::default(),
        }
    }
}

impl Settings {
    /// Merge layers in order over the built-in defaults. Scalars and lists
    /// take the value of the last layer that sets them; attribute maps are
    /// merged key by key. Fails if the result has both include and exclude.
    pub fn resolve(layers: &[Layer]) -> Result<Self, UmlError> {
        let mut settings = Self::default();

        for layer in layers {
            if let Some(arguments) = &layer.arguments {
                settings.arguments = arguments.clone();
            }
            if let Some(schema) = &layer.schema {
                settings.schema = Some(schema.clone());
            }
            if let Some(include) = &layer.include {
                settings.include = include.to_vec();
            }
            if let Some(exclude) = &layer.exclude {
                settings.exclude = exclude.to_vec();
            }
            if let Some(fields) = &layer.include_fields {
                settings.include_fields = fields.to_vec();
            }
            if let Some(include_indices) = layer.include_indices {
                settings.include_indices = include_indices;
            }
            if let Some(format) = layer.render {
                settings.format = format;
            }
            if let Some(content) = &layer.content {
                settings.content = content.clone();
            }
            for kind in AttrKind::ALL {
                if let Some(query) = layer.style_query(kind) {
                    settings
                        .style_overrides
                        .get_mut(kind)
                        .merge(&AttrMap::from_query(query));
                }
            }
        }

        if !settings.include.is_empty() && !settings.exclude.is_empty() {
            return Err(UmlError::IncludeAndExclude);
        }
        Ok(settings)
    }

    pub fn filter(&self) -> Result<Filter, UmlError> {
        Filter::new(&self.include, &self.exclude, &self.include_fields)
    }

    /// Filter for model classes, whose include / exclude lists are class names
    pub fn class_filter(&self) -> Result<Filter, UmlError> {
        Filter::for_classes(&self.include, &self.exclude, &self.include_fields)
    }

    /// Effective DOT style: defaults with caller attributes merged over them
    pub fn style(&self) -> DotStyle {
        DotStyle::with_overrides(&self.style_overrides)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            include_indices: self.include_indices,
            content: self.content.clone(),
        }
    }
}
