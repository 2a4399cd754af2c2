//! Statement execution engine
//!
//! A [`Query`] binds a [`Resolver`] to one live connection and is the sole
//! entry point business code uses; callers never touch the native driver
//! directly. Four execution shapes are offered:
//!
//! - [`Query::prepared`]: fire-and-forget, returns rows affected
//! - [`Query::prepared_result`] / [`Query::prepared_rows`]: prepared
//!   statement whose cursor feeds a handler
//! - [`Query::prepared_keys`]: prepared insert returning generated keys
//! - [`Query::statement`] family: non-prepared text with call-time arguments
//!   formatted directly into the SQL (caller escapes)
//!
//! Every prepared shape acquires its native statement from the connection's
//! prepared-statement cache on construction and releases it back when
//! dropped, so a key re-used within one unit of work does not re-prepare. A
//! `Query` is confined to one unit of work on one thread; it is not a shared
//! handle.

pub mod error;
pub mod handler;

pub use error::StatementError;
pub use handler::{
    CollectRows, KeyColumns, KeyHandler, LimitRows, LimitedResult, ResultHandler, RowHandler,
};

use crate::bank::{self, Resolver};
use crate::record::{Record, RecordMapper};
use crate::row::{ResultSet, Row};
use crate::value::Param;
use rusqlite::{CachedStatement, Connection, Statement};
use std::fmt;

/// Escapes a string for direct inclusion in SQL text (doubles single
/// quotes). Only needed with the [`Query::statement`] family; prepared
/// parameters never require escaping.
pub fn escape_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Binds positional parameters left to right (1-based on the native side).
pub(crate) fn bind_params(
    stmt: &mut Statement<'_>,
    params: &[Param],
) -> Result<(), StatementError> {
    for (i, param) in params.iter().enumerate() {
        bind_param(stmt, i + 1, param)?;
    }
    Ok(())
}

fn bind_param(stmt: &mut Statement<'_>, idx: usize, param: &Param) -> Result<(), StatementError> {
    match param {
        Param::Int(v) => stmt.raw_bind_parameter(idx, v)?,
        Param::Long(v) => stmt.raw_bind_parameter(idx, v)?,
        Param::Str(v) => stmt.raw_bind_parameter(idx, v.as_str())?,
        Param::Timestamp(v) => stmt.raw_bind_parameter(idx, v)?,
        Param::Bool(v) => stmt.raw_bind_parameter(idx, if *v { "Y" } else { "N" })?,
        Param::File(path) => {
            let meta = std::fs::metadata(path).map_err(|e| StatementError::FileParameter {
                path: path.clone(),
                source: e,
            })?;
            if meta.len() > i32::MAX as u64 {
                return Err(StatementError::FileTooLarge {
                    path: path.clone(),
                    length: meta.len(),
                });
            }
            let bytes = std::fs::read(path).map_err(|e| StatementError::FileParameter {
                path: path.clone(),
                source: e,
            })?;
            stmt.raw_bind_parameter(idx, bytes)?;
        }
        Param::Null(_) => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
    }
    Ok(())
}

/// A query bank bound to one live connection.
pub struct Query<'c> {
    conn: &'c Connection,
    resolver: Resolver,
}

impl<'c> Query<'c> {
    pub fn new(conn: &'c Connection, resolver: Resolver) -> Self {
        Query { conn, resolver }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    /// A prepared statement executed for effect only (INSERT, UPDATE,
    /// DELETE, DDL).
    pub fn prepared(&self, key: &str) -> Result<Exec<'c>, StatementError> {
        let stmt = self.prepare(key)?;
        Ok(Exec { stmt })
    }

    /// A prepared statement whose whole result cursor is handed to
    /// `handler`. Running non-SELECT text through this shape is caller
    /// misuse and fails at `call`.
    pub fn prepared_result<H: ResultHandler>(
        &self,
        key: &str,
        handler: H,
    ) -> Result<Prepared<'c, H>, StatementError> {
        let stmt = self.prepare(key)?;
        Ok(Prepared { stmt, handler })
    }

    /// A prepared statement whose rows are mapped one by one and collected.
    pub fn prepared_rows<R: RowHandler>(
        &self,
        key: &str,
        handler: R,
    ) -> Result<Prepared<'c, CollectRows<R>>, StatementError> {
        self.prepared_result(key, CollectRows(handler))
    }

    /// A prepared insert that hands the generated-key row to `handler`
    /// instead of a result cursor.
    pub fn prepared_keys<K: KeyHandler>(
        &self,
        key: &str,
        handler: K,
    ) -> Result<Keyed<'c, K>, StatementError> {
        let stmt = self.prepare(key)?;
        Ok(Keyed {
            conn: self.conn,
            stmt,
            handler,
        })
    }

    /// A non-prepared statement executed for effect only. Call-time
    /// arguments are formatted into the SQL text itself; use
    /// [`escape_string`] for untrusted values.
    pub fn statement(&self, key: &str) -> Result<PlainExec<'c>, StatementError> {
        let template = self.resolver.resolve(key)?.to_string();
        Ok(PlainExec {
            conn: self.conn,
            key: key.to_string(),
            template,
        })
    }

    /// The non-prepared variant of [`Query::prepared_result`].
    pub fn statement_result<H: ResultHandler>(
        &self,
        key: &str,
        handler: H,
    ) -> Result<Plain<'c, H>, StatementError> {
        let template = self.resolver.resolve(key)?.to_string();
        Ok(Plain {
            conn: self.conn,
            key: key.to_string(),
            template,
            handler,
        })
    }

    /// The non-prepared variant of [`Query::prepared_rows`].
    pub fn statement_rows<R: RowHandler>(
        &self,
        key: &str,
        handler: R,
    ) -> Result<Plain<'c, CollectRows<R>>, StatementError> {
        self.statement_result(key, CollectRows(handler))
    }

    /// Builds a [`Record`] wired to the mapper's configured query keys. All
    /// statements are prepared up front, so a bad mapping fails here rather
    /// than on first use.
    pub fn record<'m, T>(
        &self,
        mapper: &'m RecordMapper<T>,
    ) -> Result<Record<'c, 'm, T>, StatementError> {
        Record::new(self.conn, &self.resolver, mapper)
    }

    fn prepare(&self, key: &str) -> Result<CachedStatement<'c>, StatementError> {
        let sql = self.resolver.resolve(key)?;
        Ok(self.conn.prepare_cached(sql)?)
    }
}

/// Fire-and-forget prepared statement.
pub struct Exec<'c> {
    stmt: CachedStatement<'c>,
}

impl std::fmt::Debug for Exec<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exec").finish_non_exhaustive()
    }
}

impl Exec<'_> {
    /// Binds `params` and executes; returns the number of rows affected.
    pub fn call(&mut self, params: &[Param]) -> Result<usize, StatementError> {
        bind_params(&mut self.stmt, params)?;
        Ok(self.stmt.raw_execute()?)
    }
}

/// Prepared statement feeding a result handler.
pub struct Prepared<'c, H> {
    stmt: CachedStatement<'c>,
    handler: H,
}

impl<H: ResultHandler> Prepared<'_, H> {
    /// Binds `params`, executes, and feeds the result cursor to the handler.
    pub fn call(&mut self, params: &[Param]) -> Result<H::Output, StatementError> {
        if self.stmt.column_count() == 0 {
            return Err(StatementError::CursorMisuse(
                "statement produces no result set".to_string(),
            ));
        }
        bind_params(&mut self.stmt, params)?;
        let rows = self.stmt.raw_query();
        let mut result = ResultSet::new(rows);
        self.handler.handle(&mut result)
    }
}

/// Prepared insert returning generated keys.
pub struct Keyed<'c, K> {
    conn: &'c Connection,
    stmt: CachedStatement<'c>,
    handler: K,
}

impl<K: KeyHandler> Keyed<'_, K> {
    /// Binds `params`, executes the insert, and hands the generated-key row
    /// to the handler.
    pub fn call(&mut self, params: &[Param]) -> Result<K::Output, StatementError> {
        bind_params(&mut self.stmt, params)?;
        self.stmt.raw_execute()?;
        let keys = [self.conn.last_insert_rowid()];
        let mut row = Row::keys(&keys);
        self.handler.handle(&mut row)
    }
}

/// Fire-and-forget non-prepared statement.
pub struct PlainExec<'c> {
    conn: &'c Connection,
    key: String,
    template: String,
}

impl PlainExec<'_> {
    /// Formats `args` into the SQL text and executes one-shot, bypassing the
    /// statement cache.
    pub fn call(&self, args: &[&dyn fmt::Display]) -> Result<usize, StatementError> {
        let sql = bank::substitute(&self.key, &self.template, args)?;
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt.raw_execute()?)
    }
}

/// Non-prepared statement feeding a result handler.
pub struct Plain<'c, H> {
    conn: &'c Connection,
    key: String,
    template: String,
    handler: H,
}

impl<H: ResultHandler> Plain<'_, H> {
    /// Formats `args` into the SQL text, executes one-shot, and feeds the
    /// result cursor to the handler.
    pub fn call(&mut self, args: &[&dyn fmt::Display]) -> Result<H::Output, StatementError> {
        let sql = bank::substitute(&self.key, &self.template, args)?;
        let mut stmt = self.conn.prepare(&sql)?;
        if stmt.column_count() == 0 {
            return Err(StatementError::CursorMisuse(
                "statement produces no result set".to_string(),
            ));
        }
        let rows = stmt.raw_query();
        let mut result = ResultSet::new(rows);
        self.handler.handle(&mut result)
    }
}
