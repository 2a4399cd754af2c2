//! Versioned schema migration
//!
//! The database carries its schema version in a one-row VERSION table; the
//! running code declares the version it expects through a [`SchemaData`].
//! [`check_and_update`] reconciles the two at startup: it bootstraps a fresh
//! database, upgrades an older one script-by-script, and refuses to touch a
//! newer one. No transaction is opened; callers wanting an atomic upgrade
//! wrap the call in one.
//!
//! Scripts are plain SQL files split at the `<<>>` sentinel; programmatic
//! steps are [`SchemaAction`]s registered by name.

pub mod data;
pub mod error;
pub mod migrator;
pub mod script;

pub use data::{DirSchemaData, SchemaAction, SchemaData};
pub use error::SchemaError;
pub use migrator::{check_and_update, check_and_update_from, read_version, MigrationStep, Tier};
pub use script::{split_statements, SchemaScript, STATEMENT_DELIMITER};
