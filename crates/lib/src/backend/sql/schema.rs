//! SQL schema definitions and migrations.
//!
//! Identity columns differ between dialects (`AUTOINCREMENT` vs `BIGSERIAL`),
//! so the table DDL is chosen per [`DbKind`]. Everything else is portable.
//!
//! # Schema Version
//!
//! The stored `schema_version` must equal [`SCHEMA_VERSION`]. Opening a
//! database written by any other version fails; a schema change must bump
//! `SCHEMA_VERSION` and add its upgrade step to [`initialize`].

use crate::Result;
use crate::backend::BackendError;

use super::{DbKind, SqlxBackend, SqlxResultExt};

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 1;

const CREATE_SCHEMA_VERSION: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version BIGINT PRIMARY KEY
)";

/// Table DDL for SQLite.
pub const SQLITE_TABLES: &[&str] = &[
    CREATE_SCHEMA_VERSION,
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        login TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        master_seed TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS vault_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id BIGINT NOT NULL REFERENCES users(id),
        data_type BIGINT NOT NULL,
        data BLOB NOT NULL,
        metadata TEXT NOT NULL DEFAULT '',
        created_at BIGINT NOT NULL,
        modified_at BIGINT NOT NULL
    )",
];

/// Table DDL for PostgreSQL.
pub const POSTGRES_TABLES: &[&str] = &[
    CREATE_SCHEMA_VERSION,
    "CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        login TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        master_seed TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS vault_entries (
        id BIGSERIAL PRIMARY KEY,
        owner_id BIGINT NOT NULL REFERENCES users(id),
        data_type BIGINT NOT NULL,
        data BYTEA NOT NULL,
        metadata TEXT NOT NULL DEFAULT '',
        created_at BIGINT NOT NULL,
        modified_at BIGINT NOT NULL
    )",
];

/// SQL statements to create indexes.
pub const CREATE_INDEXES: &[&str] = &[
    // Retrieval filters on owner and type, then orders by id
    "CREATE INDEX IF NOT EXISTS idx_vault_entries_owner_type ON vault_entries(owner_id, data_type, id)",
];

fn tables_for(kind: DbKind) -> &'static [&'static str] {
    match kind {
        DbKind::Sqlite => SQLITE_TABLES,
        DbKind::Postgres => POSTGRES_TABLES,
    }
}

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist. A database stamped with any
/// version other than [`SCHEMA_VERSION`] is refused.
pub async fn initialize(backend: &SqlxBackend) -> Result<()> {
    let pool = backend.pool();

    for statement in tables_for(backend.kind()) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Schema creation failed - SQL: {statement}"))?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to initialize schema version")?;
        }
        Some((current,)) if current == SCHEMA_VERSION => {}
        Some((current,)) => {
            return Err(BackendError::SqlxError {
                reason: format!(
                    "Database schema v{current} cannot be opened by this build (v{SCHEMA_VERSION})"
                ),
                source: None,
            }
            .into());
        }
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Index creation failed - SQL: {statement}"))?;
    }

    Ok(())
}
