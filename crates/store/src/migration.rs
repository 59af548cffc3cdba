//! Schema migration logic for the bookmark store
//!
//! Reads the applied version from the singleton metadata row and applies only the
//! increments newer than it, then records the new version.

use crate::error::{Error, Result};
use crate::schema::{METADATA_ID, MIGRATIONS};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, trace};

/// Applies an ordered list of schema increments
pub struct MigrationManager<'a> {
    migrations: &'a [&'a str],
}

impl Default for MigrationManager<'static> {
    fn default() -> Self {
        Self::new(MIGRATIONS)
    }
}

impl<'a> MigrationManager<'a> {
    pub fn new(migrations: &'a [&'a str]) -> Self {
        Self { migrations }
    }

    /// Version the database is at once every increment has been applied
    pub fn target_version(&self) -> usize {
        self.migrations.len()
    }

    /// Get the current schema version from the database
    ///
    /// Returns 0 if the metadata table doesn't exist or has no version row.
    pub fn get_current_version(conn: &Connection) -> Result<usize> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='metadata')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| Error::schema(format!("Failed to check metadata table: {e}")))?;

        if !table_exists {
            trace!("metadata table does not exist, returning version 0");
            return Ok(0);
        }

        let version: Option<i64> = conn
            .query_row(
                "SELECT schema_version FROM metadata WHERE id = ?1",
                params![METADATA_ID],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::schema(format!("Failed to query schema version: {e}")))?;

        let version = version.unwrap_or(0);
        usize::try_from(version).map_err(|_| Error::schema(format!("Invalid stored schema version: {version}")))
    }

    /// Apply pending migrations and record the new version.
    ///
    /// All pending increments and the version write share one transaction, so a failing
    /// increment leaves the database at its previous version. Running this on an
    /// up-to-date database is a no-op.
    pub fn migrate(&self, conn: &mut Connection) -> Result<usize> {
        let current_version = Self::get_current_version(conn)?;
        let target_version = self.target_version();
        debug!(
            "Current schema version: {}, target: {}",
            current_version, target_version
        );

        if current_version > target_version {
            return Err(Error::schema(format!(
                "database schema version {current_version} is newer than supported version {target_version}"
            )));
        }

        if current_version == target_version {
            trace!("Schema is up to date, no migration needed");
            return Ok(current_version);
        }

        info!(
            "Migrating schema from version {} to {}",
            current_version, target_version
        );

        let tx = conn
            .transaction()
            .map_err(|e| Error::schema(format!("Failed to begin migration: {e}")))?;

        for (index, sql) in self.migrations.iter().enumerate().skip(current_version) {
            let version = index + 1;
            debug!("Applying v{} migration", version);
            tx.execute_batch(sql)
                .map_err(|e| Error::schema(format!("Failed to apply v{version} schema: {e}")))?;
        }

        tx.execute(
            r#"
            INSERT INTO metadata (id, schema_version) VALUES (?1, ?2)
            ON CONFLICT (id) DO UPDATE SET schema_version = excluded.schema_version
            "#,
            params![METADATA_ID, target_version as i64],
        )
        .map_err(|e| Error::schema(format!("Failed to record schema version: {e}")))?;

        tx.commit()
            .map_err(|e| Error::schema(format!("Failed to commit migration: {e}")))?;

        info!("Schema migration complete");
        Ok(target_version)
    }
}
