//! Handler seams between statement execution and callers
//!
//! Callers supply a handler for each execution shape: a [`ResultHandler`]
//! consumes the whole cursor and produces one value, a [`RowHandler`] maps a
//! single row (the engine collects the results into a `Vec`), and a
//! [`KeyHandler`] consumes the generated-key row of an insert. All three are
//! blanket-implemented for closures, so most call sites pass a closure.

use crate::query::StatementError;
use crate::row::{ResultSet, Row};

/// Consumes an entire result cursor, producing a scalar or aggregate value.
pub trait ResultHandler {
    type Output;

    fn handle(&mut self, result: &mut ResultSet<'_>) -> Result<Self::Output, StatementError>;
}

impl<T, F> ResultHandler for F
where
    F: FnMut(&mut ResultSet<'_>) -> Result<T, StatementError>,
{
    type Output = T;

    fn handle(&mut self, result: &mut ResultSet<'_>) -> Result<T, StatementError> {
        self(result)
    }
}

/// Maps one row to one value; the engine drives the cursor.
pub trait RowHandler {
    type Output;

    fn handle(&mut self, row: &mut Row<'_>) -> Result<Self::Output, StatementError>;
}

impl<T, F> RowHandler for F
where
    F: FnMut(&mut Row<'_>) -> Result<T, StatementError>,
{
    type Output = T;

    fn handle(&mut self, row: &mut Row<'_>) -> Result<T, StatementError> {
        self(row)
    }
}

/// Consumes the generated-key row of an insert.
///
/// The key column names are declared up front, in order, for engines that
/// must be told which columns to return; on SQLite the engine hands back the
/// single insert rowid regardless of the declared names.
pub trait KeyHandler {
    type Output;

    /// Ordered names of the generated-key columns this handler expects.
    fn key_names(&self) -> &[&str];

    fn handle(&mut self, keys: &mut Row<'_>) -> Result<Self::Output, StatementError>;
}

/// A [`KeyHandler`] built from declared column names and a closure.
pub struct KeyColumns<F> {
    names: Vec<&'static str>,
    read: F,
}

impl<F> KeyColumns<F> {
    pub fn new(names: &[&'static str], read: F) -> Self {
        KeyColumns {
            names: names.to_vec(),
            read,
        }
    }
}

impl<T, F> KeyHandler for KeyColumns<F>
where
    F: FnMut(&mut Row<'_>) -> Result<T, StatementError>,
{
    type Output = T;

    fn key_names(&self) -> &[&str] {
        &self.names
    }

    fn handle(&mut self, keys: &mut Row<'_>) -> Result<T, StatementError> {
        (self.read)(keys)
    }
}

/// Adapts a [`RowHandler`] into a [`ResultHandler`] that collects every row.
pub struct CollectRows<R>(pub R);

impl<R: RowHandler> ResultHandler for CollectRows<R> {
    type Output = Vec<R::Output>;

    fn handle(&mut self, result: &mut ResultSet<'_>) -> Result<Vec<R::Output>, StatementError> {
        let mut out = Vec::new();
        while let Some(mut row) = result.next()? {
            out.push(self.0.handle(&mut row)?);
        }
        Ok(out)
    }
}

/// Collects at most `limit` rows while still counting how many the query
/// produced, so callers can tell a truncated result from a complete one.
pub struct LimitRows<R> {
    handler: R,
    limit: usize,
}

impl<R> LimitRows<R> {
    pub fn new(handler: R, limit: usize) -> Self {
        LimitRows { handler, limit }
    }
}

/// A row list that may be a prefix of the full result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitedResult<T> {
    pub rows: Vec<T>,
    /// Total number of rows the query produced, including discarded ones.
    pub full_count: usize,
}

impl<T> LimitedResult<T> {
    pub fn is_limited(&self) -> bool {
        self.full_count > self.rows.len()
    }
}

impl<R: RowHandler> ResultHandler for LimitRows<R> {
    type Output = LimitedResult<R::Output>;

    fn handle(
        &mut self,
        result: &mut ResultSet<'_>,
    ) -> Result<LimitedResult<R::Output>, StatementError> {
        let mut rows = Vec::new();
        let mut full_count = 0;
        while let Some(mut row) = result.next()? {
            if full_count < self.limit {
                rows.push(self.handler.handle(&mut row)?);
            }
            full_count += 1;
        }
        Ok(LimitedResult { rows, full_count })
    }
}
