//! Migration-specific error types

use crate::bank::ResolveError;
use std::fmt;

/// Error raised while probing or evolving the schema version.
#[derive(Debug)]
pub enum SchemaError {
    /// The database was written by a newer release than the running code.
    /// Nothing has been mutated; the caller must refuse to operate.
    Future {
        code_version: i32,
        schema_version: i32,
    },
    /// One statement of a schema script failed.
    Script {
        statement: String,
        script: String,
        source: rusqlite::Error,
    },
    /// A schema script could not be read.
    Io {
        script: String,
        source: std::io::Error,
    },
    /// A version in the upgrade range has neither a script nor an action.
    MissingStep { version: i32 },
    /// The schema data declares no target version.
    InvalidVersion(String),
    /// Version-table maintenance failed.
    Database(rusqlite::Error),
    /// A built-in version query could not be resolved.
    Resolve(ResolveError),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::Future {
                code_version,
                schema_version,
            } => write!(
                f,
                "database schema version {schema_version} is newer than this release \
                 (expects {code_version}); refusing to touch it"
            ),
            SchemaError::Script {
                statement,
                script,
                source,
            } => write!(f, "schema script {script} failed at '{statement}': {source}"),
            SchemaError::Io { script, source } => {
                write!(f, "schema script {script} unreadable: {source}")
            }
            SchemaError::MissingStep { version } => {
                write!(f, "no script or action found for schema version {version}")
            }
            SchemaError::InvalidVersion(msg) => write!(f, "invalid schema version: {msg}"),
            SchemaError::Database(e) => write!(f, "version table maintenance failed: {e}"),
            SchemaError::Resolve(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchemaError::Script { source, .. } => Some(source),
            SchemaError::Io { source, .. } => Some(source),
            SchemaError::Database(e) => Some(e),
            SchemaError::Resolve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for SchemaError {
    fn from(e: rusqlite::Error) -> Self {
        SchemaError::Database(e)
    }
}

impl From<ResolveError> for SchemaError {
    fn from(e: ResolveError) -> Self {
        SchemaError::Resolve(e)
    }
}
