//! Transactional units of work
//!
//! Business logic runs inside [`with_query`]: the unit of work receives a
//! ready [`Query`] over an open transaction, the transaction commits when the
//! work returns `Ok` and rolls back when it returns `Err`. [`in_transaction`]
//! is the raw variant for work that drives the connection directly, such as
//! schema migration.
//!
//! The [`DbQuery`] and [`DbTransaction`] traits are blanket-implemented for
//! closures, so most call sites pass a closure.

use crate::bank::Resolver;
use crate::query::{Query, StatementError};
use rusqlite::Connection;

/// A unit of work expressed against a [`Query`].
pub trait DbQuery {
    type Output;

    fn perform(self, query: &Query<'_>) -> Result<Self::Output, StatementError>;
}

impl<T, F> DbQuery for F
where
    F: FnOnce(&Query<'_>) -> Result<T, StatementError>,
{
    type Output = T;

    fn perform(self, query: &Query<'_>) -> Result<T, StatementError> {
        self(query)
    }
}

/// A unit of work expressed against the raw connection.
pub trait DbTransaction {
    type Output;

    fn perform(self, conn: &Connection) -> Result<Self::Output, StatementError>;
}

impl<T, F> DbTransaction for F
where
    F: FnOnce(&Connection) -> Result<T, StatementError>,
{
    type Output = T;

    fn perform(self, conn: &Connection) -> Result<T, StatementError> {
        self(conn)
    }
}

/// Runs `work` inside a transaction with a [`Query`] bound to it. Commits on
/// `Ok`, rolls back on `Err` (and on panic, via the transaction guard).
pub fn with_query<W: DbQuery>(
    conn: &Connection,
    resolver: Resolver,
    work: W,
) -> Result<W::Output, StatementError> {
    let tx = conn.unchecked_transaction()?;
    let query = Query::new(conn, resolver);
    let out = work.perform(&query)?;
    drop(query);
    tx.commit()?;
    Ok(out)
}

/// Runs `work` inside a transaction against the raw connection. Commits on
/// `Ok`, rolls back on `Err`.
pub fn in_transaction<W: DbTransaction>(
    conn: &Connection,
    work: W,
) -> Result<W::Output, StatementError> {
    let tx = conn.unchecked_transaction()?;
    let out = work.perform(conn)?;
    tx.commit()?;
    Ok(out)
}
