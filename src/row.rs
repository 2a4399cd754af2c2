//! Forward-only result cursor and typed row extraction
//!
//! A [`ResultSet`] is consumed exactly once, front to back; each call to
//! [`ResultSet::next`] advances the underlying cursor by exactly one row. A
//! [`Row`] exposes typed "next value" extractors that consume one column each,
//! left to right, starting over at the first column of every row. Extractor
//! call order must match the column order of the originating query; the
//! engine does not verify that contract.
//!
//! Booleans are stored as `"Y"`/`"N"` single-character codes and decoded by
//! [`Row::next_bool`]/[`Row::nullable_bool`].

use crate::query::StatementError;
use chrono::{DateTime, NaiveDate, Utc};

/// Lazy, single-pass adapter over a native result cursor.
pub struct ResultSet<'stmt> {
    rows: rusqlite::Rows<'stmt>,
}

impl<'stmt> ResultSet<'stmt> {
    pub(crate) fn new(rows: rusqlite::Rows<'stmt>) -> Self {
        ResultSet { rows }
    }

    /// Advances to the next row, `None` once the cursor is exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<Row<'_>>, StatementError> {
        match self.rows.next()? {
            Some(row) => Ok(Some(Row::cursor(row))),
            None => Ok(None),
        }
    }
}

enum Source<'a> {
    /// A live cursor row.
    Cursor(&'a rusqlite::Row<'a>),
    /// A generated-key row; carries integral key values only.
    Keys(&'a [i64]),
}

/// One row of a result, consumed column by column.
pub struct Row<'a> {
    src: Source<'a>,
    idx: usize,
}

impl<'a> Row<'a> {
    pub(crate) fn cursor(row: &'a rusqlite::Row<'a>) -> Self {
        Row {
            src: Source::Cursor(row),
            idx: 0,
        }
    }

    pub(crate) fn keys(keys: &'a [i64]) -> Self {
        Row {
            src: Source::Keys(keys),
            idx: 0,
        }
    }

    fn take_index(&mut self) -> usize {
        let i = self.idx;
        self.idx += 1;
        i
    }

    fn key_at(&self, i: usize) -> Result<i64, StatementError> {
        match &self.src {
            Source::Keys(keys) => keys.get(i).copied().ok_or_else(|| {
                StatementError::CursorMisuse(format!(
                    "generated-key row has {} value(s), column {} requested",
                    keys.len(),
                    i + 1
                ))
            }),
            Source::Cursor(_) => unreachable!("key_at is only called for key rows"),
        }
    }

    pub fn next_int(&mut self) -> Result<i32, StatementError> {
        let i = self.take_index();
        match &self.src {
            Source::Cursor(row) => Ok(row.get(i)?),
            Source::Keys(_) => {
                let v = self.key_at(i)?;
                i32::try_from(v).map_err(|_| {
                    StatementError::CursorMisuse(format!(
                        "generated key {v} does not fit a 32-bit integer"
                    ))
                })
            }
        }
    }

    pub fn next_long(&mut self) -> Result<i64, StatementError> {
        let i = self.take_index();
        match &self.src {
            Source::Cursor(row) => Ok(row.get(i)?),
            Source::Keys(_) => self.key_at(i),
        }
    }

    pub fn next_string(&mut self) -> Result<String, StatementError> {
        let i = self.take_index();
        match &self.src {
            Source::Cursor(row) => Ok(row.get(i)?),
            Source::Keys(_) => Err(StatementError::CursorMisuse(
                "generated-key row only carries integral key values".to_string(),
            )),
        }
    }

    pub fn next_timestamp(&mut self) -> Result<DateTime<Utc>, StatementError> {
        let i = self.take_index();
        match &self.src {
            Source::Cursor(row) => Ok(row.get(i)?),
            Source::Keys(_) => Err(StatementError::CursorMisuse(
                "generated-key row only carries integral key values".to_string(),
            )),
        }
    }

    /// Consumes a timestamp column, keeping the calendar date.
    pub fn next_date(&mut self) -> Result<NaiveDate, StatementError> {
        Ok(self.next_timestamp()?.date_naive())
    }

    /// Decodes the `"Y"`/`"N"` convention. Values other than `"Y"` read as
    /// `false`; a stored third value is data corruption, not validated here.
    pub fn next_bool(&mut self) -> Result<bool, StatementError> {
        let i = self.take_index();
        match &self.src {
            Source::Cursor(row) => {
                let code: String = row.get(i)?;
                Ok(code == "Y")
            }
            Source::Keys(_) => Err(StatementError::CursorMisuse(
                "generated-key row only carries integral key values".to_string(),
            )),
        }
    }

    pub fn nullable_int(&mut self) -> Result<Option<i32>, StatementError> {
        let i = self.take_index();
        match &self.src {
            Source::Cursor(row) => Ok(row.get(i)?),
            Source::Keys(_) => Ok(Some(i32::try_from(self.key_at(i)?).map_err(|_| {
                StatementError::CursorMisuse(
                    "generated key does not fit a 32-bit integer".to_string(),
                )
            })?)),
        }
    }

    pub fn nullable_long(&mut self) -> Result<Option<i64>, StatementError> {
        let i = self.take_index();
        match &self.src {
            Source::Cursor(row) => Ok(row.get(i)?),
            Source::Keys(_) => Ok(Some(self.key_at(i)?)),
        }
    }

    pub fn nullable_string(&mut self) -> Result<Option<String>, StatementError> {
        let i = self.take_index();
        match &self.src {
            Source::Cursor(row) => Ok(row.get(i)?),
            Source::Keys(_) => Err(StatementError::CursorMisuse(
                "generated-key row only carries integral key values".to_string(),
            )),
        }
    }

    pub fn nullable_timestamp(&mut self) -> Result<Option<DateTime<Utc>>, StatementError> {
        let i = self.take_index();
        match &self.src {
            Source::Cursor(row) => Ok(row.get(i)?),
            Source::Keys(_) => Err(StatementError::CursorMisuse(
                "generated-key row only carries integral key values".to_string(),
            )),
        }
    }

    pub fn nullable_bool(&mut self) -> Result<Option<bool>, StatementError> {
        let i = self.take_index();
        match &self.src {
            Source::Cursor(row) => {
                let code: Option<String> = row.get(i)?;
                Ok(code.map(|c| c == "Y"))
            }
            Source::Keys(_) => Err(StatementError::CursorMisuse(
                "generated-key row only carries integral key values".to_string(),
            )),
        }
    }
}
