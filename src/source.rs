//! Source selection: database urls versus model modules.

use crate::error::UmlError;
use url::Url;

/// What the input arguments point at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sources {
    /// Database connection urls
    Databases(Vec<String>),
    /// Model module names
    Modules(Vec<String>),
}

impl Sources {
    /// Partition arguments. Anything containing `//` is a database url,
    /// everything else a module name. Mixing both, or passing neither, fails.
    pub fn partition<S: AsRef<str>>(arguments: &[S]) -> Result<Self, UmlError> {
        let (urls, modules): (Vec<String>, Vec<String>) = arguments
            .iter()
            .map(|a| a.as_ref().to_string())
            .partition(|a| a.contains("//"));

        match (urls.is_empty(), modules.is_empty()) {
            (true, true) => Err(UmlError::NoSource),
            (false, false) => Err(UmlError::MixedSources {
                urls: urls.iter().map(|u| redact(u)).collect(),
                modules,
            }),
            (false, true) => Ok(Sources::Databases(urls)),
            (true, false) => Ok(Sources::Modules(modules)),
        }
    }
}

/// Argument as shown in messages: a url password is replaced by `***`
pub(crate) fn redact(argument: &str) -> String {
    match Url::parse(argument) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => argument.to_string(),
    }
}
