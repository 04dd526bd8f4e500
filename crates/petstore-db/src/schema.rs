//! The `pets` table and its version stamp.

use rusqlite::Connection;
use thiserror::Error;

/// Schema version written to `PRAGMA user_version` once `pets` exists.
pub const SCHEMA_VERSION: i32 = 1;

const PETS_TABLE: &str = include_str!("schema/pets.sql");

/// Errors that can occur while preparing the catalog schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema version: {0}")]
    Version(rusqlite::Error),

    #[error("failed to create pets table: {0}")]
    Create(rusqlite::Error),

    /// The file was written by a newer build of the server.
    #[error("database schema version {found} is newer than supported version {supported}")]
    Unsupported { found: i32, supported: i32 },
}

/// Creates the `pets` table unless the database already carries it.
///
/// Returns `true` when this call created the schema. A database whose table
/// predates the version stamp keeps its rows and is only stamped.
///
/// # Errors
///
/// Returns `SchemaError::Unsupported` for a database stamped with a newer
/// version, and the underlying SQLite error for anything else.
pub fn ensure_schema(conn: &Connection) -> Result<bool, SchemaError> {
    let found: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(SchemaError::Version)?;

    if found == SCHEMA_VERSION {
        tracing::debug!(version = found, "pets schema up to date");
        return Ok(false);
    }
    if found > SCHEMA_VERSION {
        return Err(SchemaError::Unsupported {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    // The table and the stamp land together or not at all.
    let tx = conn.unchecked_transaction().map_err(SchemaError::Create)?;
    tx.execute_batch(PETS_TABLE).map_err(SchemaError::Create)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(SchemaError::Create)?;
    tx.commit().map_err(SchemaError::Create)?;

    tracing::info!(version = SCHEMA_VERSION, "created pets schema");
    Ok(true)
}
