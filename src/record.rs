//! Record mapping over bank-resolved CRUD statements
//!
//! A [`RecordMapper`] describes how one host type moves through four query
//! keys (select, insert, delete, optional update) using plain registered
//! functions; there is no runtime field discovery. [`RecordQueries`] names
//! the keys, either spelled out or derived from a base name by the
//! `conventional` naming scheme.
//!
//! The handle itself, [`Record`], is built by [`crate::Query::record`] and
//! holds prepared statements for every configured operation, so it shares the
//! connection's statement cache with everything else in the unit of work.

use crate::bank::{ResolveError, Resolver};
use crate::query::{bind_params, StatementError};
use crate::row::{ResultSet, Row};
use crate::value::Param;
use rusqlite::{CachedStatement, Connection};

/// The query keys backing one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQueries {
    pub select: String,
    pub insert: String,
    pub delete: String,
    /// Absent when the record type is never updated in place.
    pub update: Option<String>,
    /// Whether the insert produces a generated key.
    pub generated: bool,
}

impl RecordQueries {
    /// Derives the keys for `name` by convention: `<name>.select`,
    /// `<name>.insert`, `<name>.delete`, plus `<name>.update` when the bank
    /// defines it and a generated-key flag from `<name>.generated`.
    ///
    /// The probes resolve through `resolver`, so dialect and qualifier
    /// overrides apply to the flag and the optional update the same way they
    /// apply to the statements themselves.
    pub fn conventional(name: &str, resolver: &Resolver) -> Result<RecordQueries, ResolveError> {
        let update_key = format!("{name}.update");
        let update = match resolver.resolve(&update_key) {
            Ok(_) => Some(update_key),
            Err(ResolveError::MissingKey { .. }) => None,
            Err(e) => return Err(e),
        };
        let generated = match resolver.resolve(&format!("{name}.generated")) {
            Ok(flag) => flag.trim() == "true",
            Err(ResolveError::MissingKey { .. }) => false,
            Err(e) => return Err(e),
        };
        Ok(RecordQueries {
            select: format!("{name}.select"),
            insert: format!("{name}.insert"),
            delete: format!("{name}.delete"),
            update,
            generated,
        })
    }

    /// Checks that every configured key resolves, so a bad mapping fails at
    /// startup rather than on first use.
    pub fn validate(&self, resolver: &Resolver) -> Result<(), ResolveError> {
        resolver.resolve(&self.select)?;
        resolver.resolve(&self.insert)?;
        resolver.resolve(&self.delete)?;
        if let Some(update) = &self.update {
            resolver.resolve(update)?;
        }
        Ok(())
    }
}

/// Function-registered mapping between a host type and its statements.
pub struct RecordMapper<T> {
    pub queries: RecordQueries,
    /// Reads one selected row back into the host type.
    pub read: fn(&mut Row<'_>) -> Result<T, StatementError>,
    /// Parameters for the insert statement, in declaration order.
    pub insert_params: fn(&T) -> Vec<Param>,
    /// Parameters identifying the record for select and delete.
    pub key_params: fn(&T) -> Vec<Param>,
    /// Parameters for the update statement; required exactly when
    /// `queries.update` is set.
    pub update_params: Option<fn(&T) -> Vec<Param>>,
}

impl<T> RecordMapper<T> {
    fn validate(&self) -> Result<(), StatementError> {
        match (&self.queries.update, &self.update_params) {
            (Some(_), None) => Err(StatementError::InvalidRecord(
                "update query configured but no update parameters registered".to_string(),
            )),
            (None, Some(_)) => Err(StatementError::InvalidRecord(
                "update parameters registered but no update query configured".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// CRUD handle for one record type on one connection.
pub struct Record<'c, 'm, T> {
    conn: &'c Connection,
    mapper: &'m RecordMapper<T>,
    select: CachedStatement<'c>,
    insert: CachedStatement<'c>,
    delete: CachedStatement<'c>,
    update: Option<CachedStatement<'c>>,
}

impl<'c, 'm, T> Record<'c, 'm, T> {
    pub(crate) fn new(
        conn: &'c Connection,
        resolver: &Resolver,
        mapper: &'m RecordMapper<T>,
    ) -> Result<Self, StatementError> {
        mapper.validate()?;
        let q = &mapper.queries;
        let select = conn.prepare_cached(resolver.resolve(&q.select)?)?;
        let insert = conn.prepare_cached(resolver.resolve(&q.insert)?)?;
        let delete = conn.prepare_cached(resolver.resolve(&q.delete)?)?;
        let update = match &q.update {
            Some(key) => Some(conn.prepare_cached(resolver.resolve(key)?)?),
            None => None,
        };
        Ok(Record {
            conn,
            mapper,
            select,
            insert,
            delete,
            update,
        })
    }

    /// Inserts the record. Returns the generated key when the mapping
    /// declares one, `None` otherwise.
    pub fn insert(&mut self, record: &T) -> Result<Option<i64>, StatementError> {
        let params = (self.mapper.insert_params)(record);
        bind_params(&mut self.insert, &params)?;
        self.insert.raw_execute()?;
        if self.mapper.queries.generated {
            Ok(Some(self.conn.last_insert_rowid()))
        } else {
            Ok(None)
        }
    }

    /// Looks the record up by its key parameters; `None` when no row
    /// matches.
    pub fn find(&mut self, record: &T) -> Result<Option<T>, StatementError> {
        let params = (self.mapper.key_params)(record);
        bind_params(&mut self.select, &params)?;
        let rows = self.select.raw_query();
        let mut result = ResultSet::new(rows);
        match result.next()? {
            Some(mut row) => Ok(Some((self.mapper.read)(&mut row)?)),
            None => Ok(None),
        }
    }

    /// Deletes the record by its key parameters; `true` when a row was
    /// removed.
    pub fn delete(&mut self, record: &T) -> Result<bool, StatementError> {
        let params = (self.mapper.key_params)(record);
        bind_params(&mut self.delete, &params)?;
        Ok(self.delete.raw_execute()? > 0)
    }

    /// Updates the record in place; `true` when a row was changed. Fails
    /// with [`StatementError::InvalidRecord`] when the mapping has no update
    /// statement.
    pub fn update(&mut self, record: &T) -> Result<bool, StatementError> {
        let (stmt, params_fn) = match (&mut self.update, &self.mapper.update_params) {
            (Some(stmt), Some(f)) => (stmt, f),
            _ => {
                return Err(StatementError::InvalidRecord(
                    "record type has no update statement".to_string(),
                ))
            }
        };
        let params = params_fn(record);
        bind_params(stmt, &params)?;
        Ok(stmt.raw_execute()? > 0)
    }
}
