mod render;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-uml")]
#[command(version)]
#[command(
    about = "Render entity-relationship diagrams from live databases or declared models",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Introspect databases or model modules and print a DOT / PlantUML diagram
    Render {
        /// Database urls (e.g. postgresql://user@host/db, duckdb:///shop.db, duckdb:////abs/shop.db)
        /// or model module names (e.g. app.models), never both
        arguments: Vec<String>,

        /// Output format: dot, plantuml
        #[arg(short, long)]
        render: Option<String>,

        /// Database schema to reflect (default: all user schemas)
        #[arg(long)]
        schema: Option<String>,

        /// Only include tables (or classes) matching these patterns
        #[arg(short, long, value_name = "RE")]
        include: Vec<String>,

        /// Exclude tables (or classes) matching these patterns
        #[arg(short, long, value_name = "RE")]
        exclude: Vec<String>,

        /// Only include columns and indexes matching these patterns
        #[arg(long, value_name = "RE")]
        include_fields: Vec<String>,

        /// List indexes below the columns of each table
        #[arg(long)]
        include_indices: bool,

        /// Graph attributes as a query string (e.g. rankdir=LR&bgcolor=white)
        #[arg(long, value_name = "QUERY")]
        dot_graph: Option<String>,

        /// Node attributes as a query string
        #[arg(long, value_name = "QUERY")]
        dot_node: Option<String>,

        /// Edge attributes as a query string
        #[arg(long, value_name = "QUERY")]
        dot_edge: Option<String>,

        /// Table attributes as a query string; `attr.TABLE` targets one table
        #[arg(long, value_name = "QUERY")]
        dot_table: Option<String>,

        /// Cell attributes as a query string; `attr.TABLE` targets one table
        #[arg(long, value_name = "QUERY")]
        dot_td: Option<String>,

        /// Text appended verbatim to the diagram body
        #[arg(long)]
        content: Option<String>,

        /// YAML config file; command-line options take precedence
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directories searched for model files (default: current directory)
        #[arg(long, value_name = "DIR")]
        models_path: Vec<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose logging to stderr (-v info, -vv debug)
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Render {
            arguments,
            render,
            schema,
            include,
            exclude,
            include_fields,
            include_indices,
            dot_graph,
            dot_node,
            dot_edge,
            dot_table,
            dot_td,
            content,
            config,
            models_path,
            output,
            verbose,
        } => {
            init_logging(verbose);
            render::run(render::RenderArgs {
                arguments,
                render,
                schema,
                include,
                exclude,
                include_fields,
                include_indices,
                dot_graph,
                dot_node,
                dot_edge,
                dot_table,
                dot_td,
                content,
                config,
                models_path,
                output,
            })
        }
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "schema-uml", &mut io::stdout());
            Ok(())
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
