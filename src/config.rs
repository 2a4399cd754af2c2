//! Configuration loading
//!
//! Settings come from `config/querybank.toml` (optional) with environment
//! variables prefixed `QUERYBANK_` layered on top, e.g.
//! `QUERYBANK_DIALECT=postgres`. [`Settings::resolver`] turns the loaded
//! settings into a ready [`Resolver`].

use crate::bank::{Dialect, QueryBank, ResolveError, Resolver};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    /// Target SQL dialect; embedded SQLite when unset.
    #[serde(default)]
    pub dialect: Dialect,
    /// Optional resolution qualifier for customer-specific overrides.
    #[serde(default)]
    pub qualifier: Option<String>,
    /// Optional properties file layered over the built-in bank entries.
    #[serde(default)]
    pub bank_file: Option<PathBuf>,
}

impl Settings {
    /// Loads settings from `config/querybank.toml` (optional) and the
    /// `QUERYBANK_` environment.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/querybank").required(false))
            .add_source(Environment::with_prefix("QUERYBANK"))
            .build()?;
        settings.try_deserialize()
    }

    /// Builds a [`Resolver`] over the built-in bank plus the configured
    /// properties file, if any.
    pub fn resolver(&self) -> Result<Resolver, ResolveError> {
        let bank = match &self.bank_file {
            Some(path) => QueryBank::from_file(path)?,
            None => QueryBank::builtin(),
        };
        let resolver = Resolver::new(bank, self.dialect);
        Ok(match &self.qualifier {
            Some(q) => resolver.with_qualifier(q.clone()),
            None => resolver,
        })
    }
}
