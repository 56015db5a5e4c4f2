//! One run: select the source, introspect it, render the diagram.

use crate::config::Settings;
use crate::error::UmlError;
use crate::inspect::{inspect_modules, inspect_urls, ModuleLoader};
use crate::model::Diagram;
use crate::render::render;
use crate::source::Sources;
use tracing::info;

/// Build the unified model for the configured arguments.
///
/// Configuration problems are reported before any connection is opened or
/// module loaded. Introspection failures are wrapped together with the
/// arguments that caused them; nothing is returned on failure.
pub fn build_diagram(settings: &Settings, loader: &dyn ModuleLoader) -> Result<Diagram, UmlError> {
    let sources = Sources::partition(&settings.arguments)?;

    let diagram = match &sources {
        Sources::Databases(urls) => {
            let filter = settings.filter()?;
            inspect_urls(urls, settings.schema.as_deref(), &filter)
                .map_err(|e| UmlError::database(urls, e))?
        }
        Sources::Modules(modules) => {
            let filter = settings.class_filter()?;
            inspect_modules(modules, loader, &filter).map_err(|e| UmlError::models(modules, e))?
        }
    };

    info!(
        tables = diagram.table_count(),
        relations = diagram.relation_count(),
        "introspected"
    );
    Ok(diagram)
}

/// Build the model and render it with the resolved style and format
pub fn generate(settings: &Settings, loader: &dyn ModuleLoader) -> Result<String, UmlError> {
    let diagram = build_diagram(settings, loader)?;
    Ok(render(
        &diagram,
        settings.format,
        &settings.style(),
        &settings.render_options(),
    ))
}
