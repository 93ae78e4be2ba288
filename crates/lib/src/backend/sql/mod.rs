//! SQL-based vault backend.
//!
//! ## Available Dialects
//!
//! - **SQLite** (feature: `sqlite`): embedded, file or shared-cache in-memory
//! - **PostgreSQL** (feature: `postgres`)
//!
//! ## Architecture
//!
//! The SQL backend uses sqlx with `AnyPool` for multi-database support. The
//! schema is created and versioned on connect; see [`schema`] for the tables
//! and the migration hook.

mod storage;

/// Schema definition and migration system.
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::AnyPool;
use sqlx::Executor;
use sqlx::any::AnyPoolOptions;

use crate::Result;
use crate::backend::{BackendError, VaultBackend};
use crate::clock::{Clock, SystemClock};
use crate::types::{DataType, NewUser, NewVaultEntry, User, UserId, VaultEntry};

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Converts sqlx errors to `BackendError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to BackendError with context message.
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// Database backend kind for SQL dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// SQLite database
    Sqlite,
    /// PostgreSQL database
    Postgres,
}

/// SQL-based backend implementing [`VaultBackend`] using sqlx.
///
/// `users.login` carries a `UNIQUE` constraint; a violation on insert is
/// reported as [`BackendError::LoginTaken`], never as a generic SQL failure.
pub struct SqlxBackend {
    pool: AnyPool,
    kind: DbKind,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SqlxBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlxBackend")
            .field("kind", &self.kind)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl SqlxBackend {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the database kind.
    pub fn kind(&self) -> DbKind {
        self.kind
    }

    /// Timestamp new entries with `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// SQLite-specific implementations
#[cfg(feature = "sqlite")]
impl SqlxBackend {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use keeper::backend::SqlxBackend;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let backend = SqlxBackend::open_sqlite("keeper.db").await.unwrap();
    /// }
    /// ```
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url).await
    }

    /// Connect to a SQLite database using a connection URL.
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let is_in_memory = url.contains("mode=memory");

        // Foreign keys are per-connection in SQLite, so enable them on every
        // connection the pool opens.
        let mut options = AnyPoolOptions::new()
            .max_connections(5)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
                        .await?;
                    Ok(())
                })
            });

        // The shared-cache in-memory database is destroyed when its last
        // connection closes, so keep one alive for the pool's lifetime.
        if is_in_memory {
            options = options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = options
            .connect(url)
            .await
            .sql_context("Failed to connect to SQLite")?;

        if !is_in_memory {
            sqlx::query("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
                .execute(&pool)
                .await
                .sql_context("Failed to configure SQLite")?;
        }

        let backend = Self {
            pool,
            kind: DbKind::Sqlite,
            clock: Arc::new(SystemClock),
        };

        schema::initialize(&backend).await?;

        Ok(backend)
    }

    /// Create an in-memory SQLite database.
    ///
    /// The database exists only for the lifetime of this backend instance.
    pub async fn sqlite_in_memory() -> Result<Self> {
        // Shared cache so all pooled connections see one database; a unique
        // name per instance so tests do not share it.
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url).await
    }
}

// PostgreSQL-specific implementations
#[cfg(feature = "postgres")]
impl SqlxBackend {
    /// Connect to a PostgreSQL database using a connection URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use keeper::backend::SqlxBackend;
    ///
    /// let backend = SqlxBackend::connect_postgres("postgres://localhost/keeper").await.unwrap();
    /// ```
    pub async fn connect_postgres(url: &str) -> Result<Self> {
        Self::connect_postgres_with_schema(url, None).await
    }

    /// Connect to PostgreSQL inside a fresh, uniquely named schema.
    ///
    /// Each backend instance gets its own tables, so parallel tests do not
    /// interfere with each other.
    pub async fn connect_postgres_isolated(url: &str) -> Result<Self> {
        // PostgreSQL schema names must start with a letter and be lowercase
        let unique_id = uuid::Uuid::new_v4().simple().to_string();
        Self::connect_postgres_with_schema(url, Some(format!("test_{unique_id}"))).await
    }

    async fn connect_postgres_with_schema(url: &str, schema_name: Option<String>) -> Result<Self> {
        sqlx::any::install_default_drivers();

        if let Some(ref schema) = schema_name {
            let temp_pool = AnyPoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await
                .sql_context("Failed to connect to PostgreSQL")?;

            sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))
                .execute(&temp_pool)
                .await
                .sql_context(&format!("Failed to create schema {schema}"))?;

            temp_pool.close().await;
        }

        let is_isolated = schema_name.is_some();
        let mut pool_options = AnyPoolOptions::new();
        if is_isolated {
            // Keep test pools small so parallel tests don't exhaust max_connections
            pool_options = pool_options
                .max_connections(2)
                .acquire_timeout(std::time::Duration::from_secs(30));
        } else {
            pool_options = pool_options.max_connections(5);
        }

        let pool = pool_options
            .after_connect(move |conn, _meta| {
                let schema = schema_name.clone();
                Box::pin(async move {
                    if let Some(ref s) = schema {
                        let set_path = format!("SET search_path TO {s}");
                        conn.execute(set_path.as_str()).await?;
                    }
                    Ok(())
                })
            })
            .connect(url)
            .await
            .sql_context("Failed to connect to PostgreSQL")?;

        let backend = Self {
            pool,
            kind: DbKind::Postgres,
            clock: Arc::new(SystemClock),
        };

        schema::initialize(&backend).await?;

        Ok(backend)
    }
}

#[async_trait]
impl VaultBackend for SqlxBackend {
    async fn user_exists(&self, login: &str) -> Result<bool> {
        storage::user_exists(self, login).await
    }

    async fn create_user(&self, user: NewUser) -> Result<UserId> {
        storage::create_user(self, user).await
    }

    async fn get_user_by_login(&self, login: &str) -> Result<User> {
        storage::get_user_by_login(self, login).await
    }

    async fn store_entry(&self, entry: NewVaultEntry) -> Result<VaultEntry> {
        storage::store_entry(self, entry).await
    }

    async fn retrieve_entries(
        &self,
        owner_id: UserId,
        data_type: DataType,
    ) -> Result<Vec<VaultEntry>> {
        storage::retrieve_entries(self, owner_id, data_type).await
    }

    async fn get_master_seed(&self, user_id: UserId) -> Result<String> {
        storage::get_master_seed(self, user_id).await
    }
}
