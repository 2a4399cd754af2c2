//! Schema data sources
//!
//! A [`SchemaData`] supplies everything the migrator needs for one target:
//! the schema version the running code expects, scripts by file name, and
//! programmatic actions by name. [`DirSchemaData`] is the file-system-backed
//! implementation: a directory of `.sql` scripts plus a `version.txt`
//! holding the target version, with actions registered by name.

use crate::migration::{SchemaError, SchemaScript};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A programmatic migration step, run after its version's script.
pub trait SchemaAction {
    fn run(&mut self, conn: &Connection) -> Result<(), SchemaError>;
}

impl<F> SchemaAction for F
where
    F: FnMut(&Connection) -> Result<(), SchemaError>,
{
    fn run(&mut self, conn: &Connection) -> Result<(), SchemaError> {
        self(conn)
    }
}

/// Source of schema scripts and actions for one deployment target.
pub trait SchemaData {
    /// The schema version this release of the code expects.
    fn version(&self) -> i32;

    /// The script resource with the given file name, if present.
    fn resource(&self, name: &str) -> Option<SchemaScript>;

    /// A fresh instance of the named action, if one is registered.
    fn action(&self, name: &str) -> Option<Box<dyn SchemaAction>>;
}

/// [`SchemaData`] backed by a directory of script files.
pub struct DirSchemaData {
    dir: PathBuf,
    version: i32,
    actions: HashMap<String, fn() -> Box<dyn SchemaAction>>,
}

impl DirSchemaData {
    /// Opens `dir`, reading the target version from its `version.txt`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let dir = dir.as_ref().to_path_buf();
        let version_file = dir.join("version.txt");
        let text = std::fs::read_to_string(&version_file).map_err(|e| SchemaError::Io {
            script: version_file.display().to_string(),
            source: e,
        })?;
        let version = text
            .trim()
            .parse::<i32>()
            .map_err(|_| SchemaError::InvalidVersion(text.trim().to_string()))?;
        if version < 0 {
            return Err(SchemaError::InvalidVersion(version.to_string()));
        }
        Ok(DirSchemaData {
            dir,
            version,
            actions: HashMap::new(),
        })
    }

    /// Registers a constructor for the named action, e.g. `Schema_0003`.
    pub fn register(mut self, name: impl Into<String>, make: fn() -> Box<dyn SchemaAction>) -> Self {
        self.actions.insert(name.into(), make);
        self
    }
}

impl SchemaData for DirSchemaData {
    fn version(&self) -> i32 {
        self.version
    }

    fn resource(&self, name: &str) -> Option<SchemaScript> {
        let path = self.dir.join(name);
        if path.is_file() {
            Some(SchemaScript::file(name, path))
        } else {
            None
        }
    }

    fn action(&self, name: &str) -> Option<Box<dyn SchemaAction>> {
        self.actions.get(name).map(|make| make())
    }
}
