//! Version probe and schema evolution
//!
//! [`check_and_update`] is the state machine, run once at startup against a
//! list of [`MigrationStep`]s where index N is schema version N. It probes
//! the one-row VERSION table (absent table reads as -1), refuses to touch a
//! database written by a newer release, does nothing when versions match,
//! and otherwise applies every missing step in ascending order: the
//! version's script first, then its action. The VERSION row is updated
//! afterwards. No transaction is opened here; callers wanting an atomic
//! upgrade run the check inside one, e.g. via
//! [`crate::transaction::in_transaction`].
//!
//! [`check_and_update_from`] assembles the steps from a [`SchemaData`] by
//! naming convention. For version 3 on SQLite it looks for the script
//! `sqlite_0003.sql` and the action `Schema_0003`, plus the server-tier
//! pieces `sqlite_server_0003.sql` and `Server_0003`. On a [`Tier::Server`]
//! database the server pieces fold into the version's action, after the
//! common pieces. On a [`Tier::Client`] database a version with only server
//! pieces gets a logging no-op; the change happens elsewhere. A version
//! supplying nothing at all is rejected before the database is touched.

use crate::bank::Resolver;
use crate::migration::{SchemaAction, SchemaData, SchemaError, SchemaScript};
use rusqlite::Connection;

/// Which deployment tier the connected database belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// An embedded client database; server-tier pieces are skipped.
    Client,
    /// The central server database; server-tier pieces run here.
    Server,
}

/// The work attached to one schema version.
pub struct MigrationStep {
    pub script: Option<SchemaScript>,
    pub action: Option<Box<dyn SchemaAction>>,
}

impl MigrationStep {
    fn is_empty(&self) -> bool {
        self.script.is_none() && self.action.is_none()
    }

    fn run(&mut self, conn: &Connection) -> Result<(), SchemaError> {
        if let Some(script) = &self.script {
            run_script(conn, script)?;
        }
        if let Some(action) = &mut self.action {
            action.run(conn)?;
        }
        Ok(())
    }
}

/// Server-tier pieces folded into one action, run after the common script.
struct ServerOverlay {
    common: Option<Box<dyn SchemaAction>>,
    script: Option<SchemaScript>,
    action: Option<Box<dyn SchemaAction>>,
}

impl SchemaAction for ServerOverlay {
    fn run(&mut self, conn: &Connection) -> Result<(), SchemaError> {
        if let Some(common) = &mut self.common {
            common.run(conn)?;
        }
        if let Some(script) = &self.script {
            run_script(conn, script)?;
        }
        if let Some(action) = &mut self.action {
            action.run(conn)?;
        }
        Ok(())
    }
}

/// Reads the current schema version; -1 when the VERSION table is absent or
/// unreadable.
pub fn read_version(conn: &Connection, resolver: &Resolver) -> Result<i32, SchemaError> {
    let probe = resolver.resolve_number(9)?;
    match conn.query_row(probe, [], |row| row.get::<_, i32>(0)) {
        Ok(version) => Ok(version),
        Err(_) => Ok(-1),
    }
}

/// Brings the database schema up to version `steps.len() - 1`, where
/// `steps[n]` is the work for version `n`.
pub fn check_and_update(
    conn: &Connection,
    resolver: &Resolver,
    steps: &mut [MigrationStep],
) -> Result<(), SchemaError> {
    if steps.is_empty() {
        return Err(SchemaError::InvalidVersion(
            "no schema versions declared".to_string(),
        ));
    }
    // Every version must have at least a script or an action; checked before
    // the database is touched.
    for (version, step) in steps.iter().enumerate() {
        if step.is_empty() {
            return Err(SchemaError::MissingStep {
                version: version as i32,
            });
        }
    }
    let code_version = steps.len() as i32 - 1;

    let schema_version = read_version(conn, resolver)?;
    if code_version < schema_version {
        return Err(SchemaError::Future {
            code_version,
            schema_version,
        });
    }
    if code_version == schema_version {
        log::debug!("database schema already at version {schema_version}");
        return Ok(());
    }

    if schema_version == -1 {
        bootstrap_version_table(conn, resolver)?;
    }
    for (version, step) in steps.iter_mut().enumerate() {
        if version as i32 > schema_version {
            log::info!("applying schema version {version}");
            step.run(conn)?;
        }
    }
    // The bootstrap seed already recorded version 0.
    if code_version != 0 {
        let update = resolver.format_number(11, &[&code_version])?;
        conn.execute(&update, [])?;
    }
    log::info!("database schema updated from {schema_version} to {code_version}");
    Ok(())
}

/// Assembles the steps for `data` by naming convention and runs
/// [`check_and_update`] with them.
pub fn check_and_update_from(
    conn: &Connection,
    resolver: &Resolver,
    data: &dyn SchemaData,
    tier: Tier,
) -> Result<(), SchemaError> {
    let code_version = data.version();
    if code_version < 0 {
        return Err(SchemaError::InvalidVersion(code_version.to_string()));
    }
    let mut steps = Vec::with_capacity(code_version as usize + 1);
    for version in 0..=code_version {
        steps.push(step_for(data, resolver, version, tier));
    }
    check_and_update(conn, resolver, &mut steps)
}

/// Creates and seeds the VERSION table. A leftover table from a broken
/// install is dropped first; that drop is allowed to fail.
fn bootstrap_version_table(conn: &Connection, resolver: &Resolver) -> Result<(), SchemaError> {
    let _ = conn.execute(resolver.resolve_number(8)?, []);
    conn.execute(resolver.resolve_number(7)?, [])?;
    conn.execute(resolver.resolve_number(10)?, [])?;
    Ok(())
}

fn step_for(data: &dyn SchemaData, resolver: &Resolver, version: i32, tier: Tier) -> MigrationStep {
    let prefix = resolver.dialect().script_prefix();
    let tag = zero_padded(version);
    let script = data.resource(&format!("{prefix}_{tag}.sql"));
    let common_action = data.action(&format!("Schema_{tag}"));
    let server_script = data.resource(&format!("{prefix}_server_{tag}.sql"));
    let server_action = data.action(&format!("Server_{tag}"));
    let server_pieces = server_script.is_some() || server_action.is_some();

    let action: Option<Box<dyn SchemaAction>> = match tier {
        Tier::Server if server_pieces => Some(Box::new(ServerOverlay {
            common: common_action,
            script: server_script,
            action: server_action,
        })),
        Tier::Client if script.is_none() && common_action.is_none() && server_pieces => {
            Some(Box::new(move |_: &Connection| {
                log::info!(
                    "nothing to do in client; only server-side changes for version {version}"
                );
                Ok::<(), SchemaError>(())
            }))
        }
        _ => common_action,
    };
    MigrationStep { script, action }
}

fn run_script(conn: &Connection, script: &SchemaScript) -> Result<(), SchemaError> {
    for statement in script.statements()? {
        conn.execute_batch(&statement)
            .map_err(|e| SchemaError::Script {
                statement: statement.clone(),
                script: script.name().to_string(),
                source: e,
            })?;
    }
    Ok(())
}

fn zero_padded(version: i32) -> String {
    format!("{version:04}")
}
