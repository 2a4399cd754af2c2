//! Query bank: logical keys resolved to dialect-specific SQL text
//!
//! The bank is a properties-style registry mapping logical query keys such as
//! `portal.contributions.select` to SQL text. A [`Resolver`] combines a bank
//! with a [`Dialect`] and an optional qualifier and resolves keys through a
//! three-tier fallback: `key.dialect.qualifier`, then `key.dialect`, then the
//! bare `key`. The first tier that has an entry wins; a key with no entry at
//! any tier is a hard error, never a silent default.
//!
//! # Example
//!
//! Given the bank entries
//!
//! ```text
//! portal.contributions.select=(1)
//! portal.contributions.update.postgres=(2)
//! portal.contributions.update.postgres.11=(3)
//! portal.contributions.update.sqlite=(4)
//! ```
//!
//! resolving `portal.contributions.select` yields `(1)` for every dialect,
//! while `portal.contributions.update` yields `(2)` on postgres, `(3)` on
//! postgres with qualifier `11`, and `(4)` on sqlite.

pub mod dialect;

pub use dialect::{Dialect, UnknownDialect};

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Built-in entries shipped with the crate (version-table maintenance).
const BUILTIN: &str = include_str!("builtin.properties");

static BUILTIN_ENTRIES: Lazy<HashMap<String, String>> = Lazy::new(|| {
    parse_properties(BUILTIN).expect("built-in query bank must parse")
});

/// Error raised while loading or resolving bank entries.
#[derive(Debug)]
pub enum ResolveError {
    /// No entry for the key at any fallback tier.
    MissingKey {
        key: String,
        dialect: Dialect,
        qualifier: Option<String>,
    },
    /// The template consumed more `%s` substitution points than arguments
    /// were supplied.
    MissingArgument { key: String },
    /// A bank resource line could not be parsed as `key=value`.
    Syntax { line: usize },
    /// A bank resource file could not be read.
    Io(std::io::Error),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::MissingKey {
                key,
                dialect,
                qualifier,
            } => match qualifier {
                Some(q) => write!(
                    f,
                    "no query bank entry for key '{key}' (dialect {dialect}, qualifier {q})"
                ),
                None => write!(
                    f,
                    "no query bank entry for key '{key}' (dialect {dialect})"
                ),
            },
            ResolveError::MissingArgument { key } => {
                write!(f, "query '{key}' requires more arguments than were supplied")
            }
            ResolveError::Syntax { line } => {
                write!(f, "query bank line {line} is not of the form key=value")
            }
            ResolveError::Io(e) => write!(f, "query bank resource unreadable: {e}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ResolveError {
    fn from(e: std::io::Error) -> Self {
        ResolveError::Io(e)
    }
}

/// An immutable key-to-SQL registry.
///
/// Banks are constructed once at startup and shared; all mutable resolution
/// state (dialect, qualifier) lives on [`Resolver`].
#[derive(Debug, Clone)]
pub struct QueryBank {
    entries: HashMap<String, String>,
}

impl QueryBank {
    /// The built-in bank: only the version-table queries.
    pub fn builtin() -> Self {
        QueryBank {
            entries: BUILTIN_ENTRIES.clone(),
        }
    }

    /// Parses a properties-style resource and layers it over the built-in
    /// entries. Lines starting with `#` or `!` are comments; the first `=`
    /// separates key from value; later entries override earlier ones.
    pub fn parse(text: &str) -> Result<Self, ResolveError> {
        let mut entries = BUILTIN_ENTRIES.clone();
        entries.extend(parse_properties(text)?);
        Ok(QueryBank { entries })
    }

    /// Reads and parses a bank resource file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ResolveError> {
        let text = std::fs::read_to_string(path)?;
        QueryBank::parse(&text)
    }

    /// Looks up a fully qualified key, `None` if absent.
    pub fn get(&self, full_key: &str) -> Option<&str> {
        self.entries.get(full_key).map(String::as_str)
    }
}

fn parse_properties(text: &str) -> Result<HashMap<String, String>, ResolveError> {
    let mut entries = HashMap::new();
    for (n, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or(ResolveError::Syntax { line: n + 1 })?;
        entries.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(entries)
}

/// Resolution context: a bank plus the dialect and qualifier that select
/// among its entries.
///
/// A `Resolver` is an ordinary value threaded through calls. Clones share the
/// underlying bank but carry independent dialect/qualifier state, so two
/// units of work can never race on a dialect switch.
#[derive(Debug, Clone)]
pub struct Resolver {
    bank: Arc<QueryBank>,
    dialect: Dialect,
    qualifier: Option<String>,
}

impl Resolver {
    pub fn new(bank: QueryBank, dialect: Dialect) -> Self {
        Resolver {
            bank: Arc::new(bank),
            dialect,
            qualifier: None,
        }
    }

    /// Builder-style qualifier, e.g. an engine version like `"11"`.
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    /// `None` clears the qualifier.
    pub fn set_qualifier(&mut self, qualifier: Option<String>) {
        self.qualifier = qualifier;
    }

    /// Resolves a key to SQL text through the three-tier fallback.
    pub fn resolve(&self, key: &str) -> Result<&str, ResolveError> {
        if let Some(q) = &self.qualifier {
            let full = format!("{key}.{}.{q}", self.dialect.key_suffix());
            if let Some(text) = self.bank.get(&full) {
                log::debug!("query bank: {key} -> {text}");
                return Ok(text);
            }
        }
        let with_dialect = format!("{key}.{}", self.dialect.key_suffix());
        if let Some(text) = self.bank.get(&with_dialect) {
            log::debug!("query bank: {key} -> {text}");
            return Ok(text);
        }
        match self.bank.get(key) {
            Some(text) => {
                log::debug!("query bank: {key} -> {text}");
                Ok(text)
            }
            None => Err(ResolveError::MissingKey {
                key: key.to_string(),
                dialect: self.dialect,
                qualifier: self.qualifier.clone(),
            }),
        }
    }

    /// Resolves a key and substitutes `%s` points with the given arguments.
    pub fn format(&self, key: &str, args: &[&dyn fmt::Display]) -> Result<String, ResolveError> {
        let template = self.resolve(key)?;
        substitute(key, template, args)
    }

    /// Resolves a numbered query (`query.00023` for 23).
    pub fn resolve_number(&self, number: u32) -> Result<&str, ResolveError> {
        self.resolve(&number_to_key(number))
    }

    /// Resolves and formats a numbered query.
    pub fn format_number(
        &self,
        number: u32,
        args: &[&dyn fmt::Display],
    ) -> Result<String, ResolveError> {
        self.format(&number_to_key(number), args)
    }
}

fn number_to_key(number: u32) -> String {
    format!("query.{number:05}")
}

/// Substitutes each `%s` in `template` with the next argument, left to
/// right. `%%` produces a literal percent; any other `%` sequence passes
/// through unchanged. Surplus arguments are ignored; a shortfall is an
/// error.
pub(crate) fn substitute(
    key: &str,
    template: &str,
    args: &[&dyn fmt::Display],
) -> Result<String, ResolveError> {
    let mut out = String::with_capacity(template.len());
    let mut next = 0;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') => {
                chars.next();
                let arg = args.get(next).ok_or_else(|| ResolveError::MissingArgument {
                    key: key.to_string(),
                })?;
                // Display into the output; infallible for String targets.
                let _ = write!(out, "{arg}");
                next += 1;
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }
    Ok(out)
}
