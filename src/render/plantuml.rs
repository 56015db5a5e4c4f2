//! PlantUML class diagram output.

use super::RenderOptions;
use crate::model::{Diagram, Field, Table};

const INDENT: &str = "    ";

/// Generate a PlantUML class diagram for a diagram
pub fn to_plantuml(diagram: &Diagram, options: &RenderOptions) -> String {
    let mut blocks = vec![
        "@startuml".to_string(),
        "skinparam defaultFontName Courier".to_string(),
    ];

    for table in &diagram.tables {
        blocks.push(format_class(table, options.include_indices));
    }

    for relation in &diagram.relations {
        blocks.push(format!(
            "{} <--o {}: {}",
            relation.from, relation.to, relation.by
        ));
    }

    if !options.content.is_empty() {
        blocks.push(options.content.trim_end().to_string());
    }

    blocks.push("@enduml".to_string());

    let mut output = blocks.join("\n\n");
    output.push('\n');
    output
}

/// One class block with name / role / type aligned in columns
fn format_class(table: &Table, include_indices: bool) -> String {
    let rows: Vec<&Field> = table.rows(include_indices).collect();
    let cells = |field: &Field| -> [String; 3] {
        [
            field.name.clone(),
            field.role.marker().to_string(),
            field.field_type.clone(),
        ]
    };

    let mut widths = [0usize; 3];
    for &field in &rows {
        for (width, cell) in widths.iter_mut().zip(cells(field)) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = vec![format!("Class {} {{", table.name)];
    for &field in &rows {
        let padded: Vec<String> = cells(field)
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        lines.push(format!("{}{}", INDENT, padded.join(" ")).trim_end().to_string());
    }
    lines.push("}".to_string());
    lines.join("\n")
}
