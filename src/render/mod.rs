//! Diagram serialization to Graphviz DOT or PlantUML.

mod dot;
mod plantuml;
pub mod style;

pub use dot::to_dot;
pub use plantuml::to_plantuml;
pub use style::{AttrKind, AttrMap, DotStyle};

use crate::model::Diagram;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format of a rendered diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    /// Graphviz DOT with HTML-like table nodes
    #[default]
    Dot,
    /// PlantUML class diagram
    PlantUml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dot" | "graphviz" => Ok(OutputFormat::Dot),
            "plantuml" | "puml" | "uml" => Ok(OutputFormat::PlantUml),
            _ => Err(format!(
                "Unknown format: {}. Valid options: dot, plantuml",
                s
            )),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.to_string()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Dot => write!(f, "dot"),
            OutputFormat::PlantUml => write!(f, "plantuml"),
        }
    }
}

/// Options shared by both output formats
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Append one row per index after the column rows
    pub include_indices: bool,
    /// Free text appended verbatim to the diagram body
    pub content: String,
}

/// Render a diagram in the given format. `style` only affects DOT output.
pub fn render(
    diagram: &Diagram,
    format: OutputFormat,
    style: &DotStyle,
    options: &RenderOptions,
) -> String {
    match format {
        OutputFormat::Dot => to_dot(diagram, style, options),
        OutputFormat::PlantUml => to_plantuml(diagram, options),
    }
}
