//! Statement parameter values
//!
//! [`Param`] is the closed set of host values accepted as positional
//! statement parameters. SQL NULL is never spelled as a bare missing value;
//! it is always one of the typed markers in [`NullKind`], so the engine knows
//! which native NULL type to bind. The `nullable_*` constructors coerce an
//! `Option` into either the value or the matching marker.
//!
//! Booleans are persisted as the single-character codes `"Y"`/`"N"`, not as a
//! native boolean column. File parameters are bound as BLOBs sourced from the
//! file's full contents.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::path::{Path, PathBuf};

/// The type carried by a SQL NULL parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullKind {
    Int,
    Long,
    Str,
    Timestamp,
    Bool,
    File,
}

/// A positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// UTF-8 text.
    Str(String),
    /// Point in time; calendar dates convert to midnight UTC.
    Timestamp(DateTime<Utc>),
    /// Stored as `"Y"` or `"N"`.
    Bool(bool),
    /// File contents bound as a BLOB at call time.
    File(PathBuf),
    /// A typed SQL NULL.
    Null(NullKind),
}

impl Param {
    pub fn nullable_int(value: Option<i32>) -> Param {
        value.map_or(Param::Null(NullKind::Int), Param::Int)
    }

    pub fn nullable_long(value: Option<i64>) -> Param {
        value.map_or(Param::Null(NullKind::Long), Param::Long)
    }

    pub fn nullable_str(value: Option<String>) -> Param {
        value.map_or(Param::Null(NullKind::Str), Param::Str)
    }

    pub fn nullable_timestamp(value: Option<DateTime<Utc>>) -> Param {
        value.map_or(Param::Null(NullKind::Timestamp), Param::Timestamp)
    }

    pub fn nullable_bool(value: Option<bool>) -> Param {
        value.map_or(Param::Null(NullKind::Bool), Param::Bool)
    }

    pub fn nullable_file(value: Option<PathBuf>) -> Param {
        value.map_or(Param::Null(NullKind::File), Param::File)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Long(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Str(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Str(v)
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<DateTime<Utc>> for Param {
    fn from(v: DateTime<Utc>) -> Self {
        Param::Timestamp(v)
    }
}

impl From<NaiveDateTime> for Param {
    fn from(v: NaiveDateTime) -> Self {
        Param::Timestamp(v.and_utc())
    }
}

impl From<NaiveDate> for Param {
    fn from(v: NaiveDate) -> Self {
        Param::Timestamp(v.and_time(NaiveTime::MIN).and_utc())
    }
}

impl From<PathBuf> for Param {
    fn from(v: PathBuf) -> Self {
        Param::File(v)
    }
}

impl From<&Path> for Param {
    fn from(v: &Path) -> Self {
        Param::File(v.to_path_buf())
    }
}
