//! Errors surfaced to the invoking caller.

use crate::source::redact;
use thiserror::Error;

/// Failures a caller has to tell apart: configuration problems detected
/// before any I/O, and a database / model source that could not be read.
#[derive(Debug, Error)]
pub enum UmlError {
    #[error("use either include or exclude, not both")]
    IncludeAndExclude,

    #[error("either a database url or a model module argument is required")]
    NoSource,

    #[error("both database urls and model modules specified: {urls:?} / {modules:?}")]
    MixedSources {
        urls: Vec<String>,
        modules: Vec<String>,
    },

    #[error("invalid {option} pattern '{pattern}': {source}")]
    InvalidPattern {
        option: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cannot open database: {} ({source:#})", .arguments.join(" "))]
    Database {
        arguments: Vec<String>,
        #[source]
        source: anyhow::Error,
    },

    #[error("cannot load model modules: {} ({source:#})", .modules.join(" "))]
    Models {
        modules: Vec<String>,
        #[source]
        source: anyhow::Error,
    },
}

impl UmlError {
    /// Wrap an introspection failure together with the offending arguments,
    /// their passwords masked
    pub fn database(arguments: &[String], source: anyhow::Error) -> Self {
        UmlError::Database {
            arguments: arguments.iter().map(|a| redact(a)).collect(),
            source,
        }
    }

    pub fn models(modules: &[String], source: anyhow::Error) -> Self {
        UmlError::Models {
            modules: modules.to_vec(),
            source,
        }
    }
}
