//! Statement-level error types

use crate::bank::ResolveError;
use std::fmt;
use std::path::PathBuf;

/// Error raised while preparing, binding, or executing a statement, or while
/// consuming its result cursor.
///
/// Nothing here is recovered locally; callers let it propagate to the
/// surrounding transaction boundary, which rolls back.
#[derive(Debug)]
pub enum StatementError {
    /// Query bank resolution failed.
    Resolve(ResolveError),
    /// Native driver failure.
    Database(rusqlite::Error),
    /// A file parameter could not be read.
    FileParameter {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A file parameter exceeds the representable BLOB length.
    FileTooLarge { path: PathBuf, length: u64 },
    /// Misuse of a single-pass cursor (iterating a statement that produces no
    /// result set, or extracting a column a key row cannot carry).
    CursorMisuse(String),
    /// A record mapper's configuration does not match its query keys.
    InvalidRecord(String),
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementError::Resolve(e) => write!(f, "{e}"),
            StatementError::Database(e) => write!(f, "statement failed: {e}"),
            StatementError::FileParameter { path, source } => {
                write!(f, "cannot read file parameter {}: {source}", path.display())
            }
            StatementError::FileTooLarge { path, length } => {
                write!(
                    f,
                    "file parameter {} too large for a BLOB: {length} bytes",
                    path.display()
                )
            }
            StatementError::CursorMisuse(msg) => write!(f, "result cursor misuse: {msg}"),
            StatementError::InvalidRecord(msg) => write!(f, "invalid record mapping: {msg}"),
        }
    }
}

impl std::error::Error for StatementError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StatementError::Resolve(e) => Some(e),
            StatementError::Database(e) => Some(e),
            StatementError::FileParameter { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ResolveError> for StatementError {
    fn from(e: ResolveError) -> Self {
        StatementError::Resolve(e)
    }
}

impl From<rusqlite::Error> for StatementError {
    fn from(e: rusqlite::Error) -> Self {
        StatementError::Database(e)
    }
}
