//! Password lookup in a `~/.pgpass`-style credential file.
//!
//! Lets documentation sources reference databases without embedding
//! passwords. Works for any dialect, not only PostgreSQL.
//!
//! Line format: `hostname:port:database:username:password`. Blank lines and
//! lines starting with `#` are ignored, `\:` and `\\` escape a literal colon
//! or backslash, and a `*` field matches any value. The first matching line
//! wins.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// Environment variable overriding the credential file location
pub const PGPASSFILE_ENV: &str = "PGPASSFILE";

/// One parsed credential line
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    host: String,
    port: String,
    database: String,
    username: String,
    password: String,
}

impl Entry {
    fn parse(line: &str) -> Option<Self> {
        let fields = split_fields(line);
        if fields.len() < 5 {
            return None;
        }
        let mut fields = fields.into_iter();
        Some(Self {
            host: fields.next()?,
            port: fields.next()?,
            database: fields.next()?,
            username: fields.next()?,
            // Unescaped colons past the fourth separator belong to the password
            password: fields.collect::<Vec<_>>().join(":"),
        })
    }

    fn matches(&self, key: &LookupKey) -> bool {
        field_matches(&self.host, key.host.as_deref())
            && field_matches(&self.port, key.port.as_deref())
            && field_matches(&self.database, key.database.as_deref())
            && field_matches(&self.username, key.username.as_deref())
    }
}

fn field_matches(pattern: &str, value: Option<&str>) -> bool {
    pattern == "*" || value == Some(pattern)
}

fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Connection fields a credential line is matched against, percent-decoded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupKey {
    pub host: Option<String>,
    pub port: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
}

impl LookupKey {
    /// Take host, port, database and username from a connection url
    pub fn from_url(url: &Url) -> Self {
        Self {
            host: url.host_str().and_then(decoded),
            port: url.port().map(|p| p.to_string()),
            database: url.path().strip_prefix('/').and_then(decoded),
            username: decoded(url.username()),
        }
    }
}

fn decoded(component: &str) -> Option<String> {
    if component.is_empty() {
        return None;
    }
    let value = urlencoding::decode(component)
        .map(|value| value.into_owned())
        .unwrap_or_else(|_| component.to_string());
    Some(value)
}

/// Parsed credential file
#[derive(Debug, Clone, Default)]
pub struct PgPass {
    entries: Vec<Entry>,
}

impl PgPass {
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(Entry::parse)
            .collect();
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("could not open {} for reading", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Default location: `$PGPASSFILE`, else `~/.pgpass`
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(PGPASSFILE_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|home| home.join(".pgpass"))
    }

    /// First password whose line matches the key
    pub fn lookup(&self, key: &LookupKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.matches(key))
            .map(|entry| entry.password.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fill in a missing url password from the credential file at `path`.
///
/// Read failures are reported and the url is returned unchanged.
pub fn resolve_password(url: &mut Url, path: Option<&Path>) {
    if url.password().is_some() {
        return;
    }
    let Some(path) = path else {
        return;
    };

    let pgpass = match PgPass::load(path) {
        Ok(pgpass) => pgpass,
        Err(e) => {
            warn!("{:#}", e);
            return;
        }
    };

    debug!(entries = pgpass.len(), "read {}", path.display());
    let password = pgpass
        .lookup(&LookupKey::from_url(url))
        .map(str::to_string);
    if let Some(password) = password {
        debug!(host = url.host_str(), "password taken from {}", path.display());
        // Url keeps userinfo percent-encoded; a literal `%` must survive decoding
        let encoded = urlencoding::encode(&password);
        if url.set_password(Some(&*encoded)).is_err() {
            warn!("cannot set a password on {}", url.scheme());
        }
    }
}
