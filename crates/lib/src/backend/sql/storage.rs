//! User and vault entry operations for SQL backends.

use tracing::debug;

use crate::Result;
use crate::backend::BackendError;
use crate::clock::millis_to_datetime;
use crate::types::{DataType, NewUser, NewVaultEntry, User, UserId, VaultEntry};

use super::{SqlxBackend, SqlxResultExt};

type EntryRow = (i64, i64, i64, Vec<u8>, String, i64, i64);

/// Which integrity constraint an insert tripped, if any.
enum Violation {
    Unique,
    ForeignKey,
}

fn violation(err: &sqlx::Error) -> Option<Violation> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    // SQLSTATE codes cover PostgreSQL; the kind helpers cover SQLite.
    let code = db_err.code();
    if db_err.is_unique_violation() || code.as_deref() == Some("23505") {
        Some(Violation::Unique)
    } else if db_err.is_foreign_key_violation() || code.as_deref() == Some("23503") {
        Some(Violation::ForeignKey)
    } else {
        None
    }
}

fn entry_from_row(row: EntryRow) -> Result<VaultEntry> {
    let (id, owner_id, code, data, metadata, created_at, modified_at) = row;
    let data_type = DataType::from_code(code).ok_or(BackendError::InvalidDataType { code })?;
    Ok(VaultEntry {
        id,
        owner_id: UserId(owner_id),
        data_type,
        data,
        metadata,
        created_at: millis_to_datetime(created_at),
        modified_at: millis_to_datetime(modified_at),
    })
}

pub async fn user_exists(backend: &SqlxBackend, login: &str) -> Result<bool> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE login = $1")
        .bind(login)
        .fetch_one(backend.pool())
        .await
        .sql_context("Failed to check user existence")?;
    Ok(count > 0)
}

/// Insert a user. The `UNIQUE` constraint on `login` is the arbiter.
pub async fn create_user(backend: &SqlxBackend, user: NewUser) -> Result<UserId> {
    let result: std::result::Result<(i64,), sqlx::Error> = sqlx::query_as(
        "INSERT INTO users (login, password_hash, master_seed)
         VALUES ($1, $2, $3)
         RETURNING id",
    )
    .bind(&user.login)
    .bind(&user.password_hash)
    .bind(&user.master_seed)
    .fetch_one(backend.pool())
    .await;

    match result {
        Ok((id,)) => {
            debug!(user_id = id, "Created user");
            Ok(UserId(id))
        }
        Err(e) if matches!(violation(&e), Some(Violation::Unique)) => {
            Err(BackendError::LoginTaken { login: user.login }.into())
        }
        Err(e) => Err(e).sql_context("Failed to insert user"),
    }
}

pub async fn get_user_by_login(backend: &SqlxBackend, login: &str) -> Result<User> {
    let row: Option<(i64, String, String, String)> = sqlx::query_as(
        "SELECT id, login, password_hash, master_seed FROM users WHERE login = $1",
    )
    .bind(login)
    .fetch_optional(backend.pool())
    .await
    .sql_context("Failed to get user")?;

    match row {
        Some((id, login, password_hash, master_seed)) => Ok(User {
            id: UserId(id),
            login,
            password_hash,
            master_seed,
        }),
        None => Err(BackendError::LoginNotFound {
            login: login.to_string(),
        }
        .into()),
    }
}

pub async fn store_entry(backend: &SqlxBackend, entry: NewVaultEntry) -> Result<VaultEntry> {
    let now = backend.clock().now_millis() as i64;

    let result: std::result::Result<(i64,), sqlx::Error> = sqlx::query_as(
        "INSERT INTO vault_entries (owner_id, data_type, data, metadata, created_at, modified_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(entry.owner_id.0)
    .bind(entry.data_type.code())
    .bind(entry.data.clone())
    .bind(&entry.metadata)
    .bind(now)
    .bind(now)
    .fetch_one(backend.pool())
    .await;

    match result {
        Ok((id,)) => {
            debug!(entry_id = id, owner_id = %entry.owner_id, data_type = %entry.data_type, "Stored entry");
            Ok(entry.into_entry(id, millis_to_datetime(now)))
        }
        Err(e) if matches!(violation(&e), Some(Violation::ForeignKey)) => {
            Err(BackendError::UnknownOwner {
                owner_id: entry.owner_id,
            }
            .into())
        }
        Err(e) => Err(e).sql_context("Failed to insert vault entry"),
    }
}

pub async fn retrieve_entries(
    backend: &SqlxBackend,
    owner_id: UserId,
    data_type: DataType,
) -> Result<Vec<VaultEntry>> {
    let rows: Vec<EntryRow> = sqlx::query_as(
        "SELECT id, owner_id, data_type, data, metadata, created_at, modified_at
         FROM vault_entries
         WHERE owner_id = $1 AND data_type = $2
         ORDER BY id",
    )
    .bind(owner_id.0)
    .bind(data_type.code())
    .fetch_all(backend.pool())
    .await
    .sql_context("Failed to retrieve vault entries")?;

    rows.into_iter().map(entry_from_row).collect()
}

pub async fn get_master_seed(backend: &SqlxBackend, user_id: UserId) -> Result<String> {
    let row: Option<(String,)> = sqlx::query_as("SELECT master_seed FROM users WHERE id = $1")
        .bind(user_id.0)
        .fetch_optional(backend.pool())
        .await
        .sql_context("Failed to get master seed")?;

    row.map(|(seed,)| seed)
        .ok_or_else(|| BackendError::UserNotFound { id: user_id }.into())
}
