//! # Querybank
//!
//! Dialect-aware SQL query bank, connection-scoped statement execution, and
//! versioned schema migration over embedded SQLite.
//!
//! SQL lives in properties-style bank resources keyed by logical name and
//! resolved per dialect; business code executes by key through a [`Query`]
//! bound to one connection, inside a [`with_query`] unit of work.

pub mod bank;
pub mod config;
pub mod migration;
pub mod query;
pub mod record;
pub mod row;
pub mod transaction;
pub mod value;

pub use bank::{Dialect, QueryBank, ResolveError, Resolver, UnknownDialect};
pub use config::Settings;
pub use migration::{
    check_and_update, check_and_update_from, read_version, DirSchemaData, SchemaAction,
    SchemaData, SchemaError, SchemaScript, Tier,
};
pub use query::{
    escape_string, CollectRows, KeyColumns, KeyHandler, LimitRows, LimitedResult, Query,
    ResultHandler, RowHandler, StatementError,
};
pub use record::{Record, RecordMapper, RecordQueries};
pub use row::{ResultSet, Row};
pub use transaction::{in_transaction, with_query, DbQuery, DbTransaction};
pub use value::{NullKind, Param};
