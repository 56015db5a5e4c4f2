//! Graphviz DOT output with one HTML-like table node per table.

use super::style::{AttrKind, DotStyle};
use super::RenderOptions;
use crate::model::{Diagram, Table};

/// Generate a DOT digraph for a diagram
pub fn to_dot(diagram: &Diagram, style: &DotStyle, options: &RenderOptions) -> String {
    let mut output = String::new();

    output.push_str("/* generated by schema-uml */\n\n");
    output.push_str("digraph G {\n");
    for kind in [AttrKind::Graph, AttrKind::Node, AttrKind::Edge] {
        output.push_str(&format!("    {} [{}]\n", kind, style.resolve(kind, None)));
    }

    for table in &diagram.tables {
        output.push('\n');
        output.push_str(&table_node(table, style, options.include_indices));
    }

    if !diagram.relations.is_empty() {
        output.push('\n');
    }
    for relation in &diagram.relations {
        output.push_str(&format!(
            "    {} -> {} [label=\"{}\"]\n",
            escape_dot_id(&relation.from),
            escape_dot_id(&relation.to),
            relation.by.replace('"', "\\\"")
        ));
    }

    if !options.content.is_empty() {
        output.push('\n');
        output.push_str(&options.content);
        if !options.content.ends_with('\n') {
            output.push('\n');
        }
    }

    output.push_str("}\n");
    output
}

/// One table node: a bold header row, then name / role / type rows
fn table_node(table: &Table, style: &DotStyle, include_indices: bool) -> String {
    let td = style.resolve(AttrKind::Td, Some(&table.name));
    let mut node = String::new();

    node.push_str(&format!("    {} [label=<\n", escape_dot_id(&table.name)));
    node.push_str(&format!(
        "      <TABLE {}>\n",
        style.resolve(AttrKind::Table, Some(&table.name))
    ));
    node.push_str("        <TR>\n");
    node.push_str(
        "          <TD COLSPAN=\"3\" CELLPADDING=\"4\" ALIGN=\"CENTER\" BORDER=\"2\" SIDES=\"B\">\n",
    );
    node.push_str(&format!(
        "            <B><FONT COLOR=\"black\">{}</FONT></B>\n",
        escape_html(&table.name)
    ));
    node.push_str("          </TD>\n");
    node.push_str("        </TR>\n");

    for field in table.rows(include_indices) {
        node.push_str("        <TR>\n");
        for cell in [
            field.name.as_str(),
            field.role.marker(),
            field.field_type.as_str(),
        ] {
            node.push_str(&format!("          <TD {}>{}</TD>\n", td, escape_html(cell)));
        }
        node.push_str("        </TR>\n");
    }

    node.push_str("      </TABLE>\n");
    node.push_str("    >]\n");
    node
}

/// Escape a string for use in DOT HTML labels
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Quote a string as a DOT node ID
fn escape_dot_id(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
