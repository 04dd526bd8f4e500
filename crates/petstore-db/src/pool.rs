//! Connection pool over the catalog database.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Where the catalog lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// A database file, created on first open.
    File(PathBuf),
    /// A private in-memory database that lasts as long as its pool.
    Memory,
}

impl DbLocation {
    /// `:memory:` selects an in-memory database; anything else is a file path.
    pub fn from_path(path: &str) -> Self {
        if path == ":memory:" {
            DbLocation::Memory
        } else {
            DbLocation::File(PathBuf::from(path))
        }
    }
}

impl fmt::Display for DbLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbLocation::File(path) => write!(f, "{}", path.display()),
            DbLocation::Memory => f.write_str(":memory:"),
        }
    }
}

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections. Ignored for
    /// [`DbLocation::Memory`], which always uses exactly one.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to open database pool at {location}: {source}")]
    Open {
        location: String,
        source: r2d2::Error,
    },
}

fn prepare_connection(
    conn: &mut Connection,
    busy_timeout: Duration,
    wal: bool,
) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(busy_timeout)?;
    if wal {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            return Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("journal_mode stayed {mode}, expected wal")),
            ));
        }
    }
    Ok(())
}

/// Opens a pool for `location`.
///
/// File databases get WAL journaling and up to `pool_max_size` connections.
/// Every SQLite in-memory connection is its own database, so a
/// [`DbLocation::Memory`] pool holds a single connection that is never
/// recycled.
///
/// # Errors
///
/// Returns `PoolError::Open` if the first connection cannot be opened or
/// configured.
pub fn create_pool(location: &DbLocation, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let busy_timeout = Duration::from_millis(settings.busy_timeout_ms);

    let builder = Pool::builder();
    let (manager, builder) = match location {
        DbLocation::File(path) => (
            SqliteConnectionManager::file(path)
                .with_init(move |conn| prepare_connection(conn, busy_timeout, true)),
            builder.max_size(settings.pool_max_size),
        ),
        DbLocation::Memory => (
            SqliteConnectionManager::memory()
                .with_init(move |conn| prepare_connection(conn, busy_timeout, false)),
            builder.max_size(1).idle_timeout(None).max_lifetime(None),
        ),
    };

    let pool = builder.build(manager).map_err(|source| PoolError::Open {
        location: location.to_string(),
        source,
    })?;

    tracing::debug!(
        location = %location,
        max_size = pool.max_size(),
        "opened database pool"
    );

    Ok(pool)
}
