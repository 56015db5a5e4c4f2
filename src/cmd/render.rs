//! Render command implementation.

use anyhow::{Context, Result};
use schema_uml::config::{Layer, Patterns, Settings};
use schema_uml::inspect::FileLoader;
use schema_uml::pipeline::generate;
use schema_uml::render::OutputFormat;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Command-line values of the render command
pub struct RenderArgs {
    pub arguments: Vec<String>,
    pub render: Option<String>,
    pub schema: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub include_fields: Vec<String>,
    pub include_indices: bool,
    pub dot_graph: Option<String>,
    pub dot_node: Option<String>,
    pub dot_edge: Option<String>,
    pub dot_table: Option<String>,
    pub dot_td: Option<String>,
    pub content: Option<String>,
    pub config: Option<PathBuf>,
    pub models_path: Vec<PathBuf>,
    pub output: Option<PathBuf>,
}

impl RenderArgs {
    /// Options given on the command line; absent flags leave the config file in effect
    fn layer(&self) -> Result<Layer> {
        let render = self
            .render
            .as_deref()
            .map(str::parse::<OutputFormat>)
            .transpose()
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        let patterns = |values: &[String]| {
            (!values.is_empty()).then(|| Patterns::List(values.to_vec()))
        };

        Ok(Layer {
            arguments: (!self.arguments.is_empty()).then(|| self.arguments.clone()),
            schema: self.schema.clone(),
            include: patterns(&self.include),
            exclude: patterns(&self.exclude),
            include_fields: patterns(&self.include_fields),
            include_indices: self.include_indices.then_some(true),
            render,
            content: self.content.clone(),
            dot_graph: self.dot_graph.clone(),
            dot_node: self.dot_node.clone(),
            dot_edge: self.dot_edge.clone(),
            dot_table: self.dot_table.clone(),
            dot_td: self.dot_td.clone(),
        })
    }
}

/// Run the render command
pub fn run(args: RenderArgs) -> Result<()> {
    let mut layers = Vec::new();
    if let Some(path) = &args.config {
        layers.push(Layer::load(path)?);
    }
    layers.push(args.layer()?);

    let settings = Settings::resolve(&layers)?;
    let loader = FileLoader::new(args.models_path.clone());
    let diagram = generate(&settings, &loader)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &diagram)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            eprintln!(
                "Diagram written to: {} [format: {}]",
                path.display(),
                settings.format
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(diagram.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
