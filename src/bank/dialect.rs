//! Target database dialects

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A target database engine family.
///
/// The dialect selects which query bank entries apply (`key.sqlite` vs.
/// `key.postgres`) and which schema script files the migration engine looks
/// up (`sqlite_0000.sql` vs. `postgres_0000.sql`). It never changes how a
/// statement executes; only which SQL text is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Embedded SQLite, the default deployment target.
    #[default]
    Sqlite,
    /// Client/server PostgreSQL.
    Postgres,
}

impl Dialect {
    /// The suffix appended to query keys for this dialect (`key.sqlite`).
    pub fn key_suffix(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }

    /// The prefix of schema script file names for this dialect
    /// (`sqlite_0000.sql`).
    pub fn script_prefix(self) -> &'static str {
        self.key_suffix()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_suffix())
    }
}

/// Error returned when parsing an unknown dialect name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDialect(pub String);

impl fmt::Display for UnknownDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown database dialect: {}", self.0)
    }
}

impl std::error::Error for UnknownDialect {}

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" => Ok(Dialect::Postgres),
            other => Err(UnknownDialect(other.to_string())),
        }
    }
}
