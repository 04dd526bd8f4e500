//! Database layer for the pet store.
//!
//! Opens the catalog database described by a [`DbLocation`] as an `r2d2`
//! pool and creates the `pets` table on first start.
//!
//! # Design decisions
//!
//! - **Embedded SQLite**: no external database process is required. File
//!   databases run in WAL mode so readers never block the single writer.
//! - **`r2d2` connection pool**: every request checks a connection out and
//!   the guard returns it to the pool when dropped, on every exit path.
//! - **Schema version in `PRAGMA user_version`**: the catalog has one table,
//!   so the database header records which schema it carries instead of a
//!   separate bookkeeping table.

mod pool;
mod schema;

pub use pool::{create_pool, DbLocation, DbPool, DbRuntimeSettings, PoolError};
pub use schema::{ensure_schema, SchemaError, SCHEMA_VERSION};
