//! Backend creation and utility functions.

use std::sync::Arc;

use keeper::backend::{InMemory, VaultBackend};

use crate::cli::{Backend, ServeArgs};

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "postgres://***@<unparsable-url>".to_string()
    }
}

/// Short human-readable name of a backend.
pub fn backend_label(backend: Backend) -> &'static str {
    match backend {
        Backend::Sqlite => "sqlite",
        Backend::Postgres => "postgres",
        Backend::Inmemory => "inmemory",
    }
}

/// Create the appropriate backend based on configuration
pub async fn create_backend(
    args: &ServeArgs,
) -> Result<Arc<dyn VaultBackend>, Box<dyn std::error::Error>> {
    match args.backend {
        #[cfg(feature = "sqlite")]
        Backend::Sqlite => {
            let data_dir = args
                .data_dir
                .clone()
                .unwrap_or_else(|| std::path::PathBuf::from("."));
            tokio::fs::create_dir_all(&data_dir).await?;

            let db_path = data_dir.join("keeper.db");
            tracing::info!("Using SQLite backend at {}", db_path.display());
            let backend = keeper::backend::SqlxBackend::open_sqlite(&db_path).await?;
            Ok(Arc::new(backend))
        }
        #[cfg(feature = "postgres")]
        Backend::Postgres => {
            let url = args
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or KEEPER_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!("Connecting to PostgreSQL backend at {}", display_url);

            match keeper::backend::SqlxBackend::connect_postgres(url).await {
                Ok(backend) => {
                    tracing::info!("Connected to PostgreSQL successfully");
                    Ok(Arc::new(backend))
                }
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {display_url}: {e}").into())
                }
            }
        }
        Backend::Inmemory => {
            tracing::warn!("Using in-memory backend; all accounts and entries are lost on exit");
            Ok(Arc::new(InMemory::new()))
        }
        #[allow(unreachable_patterns)]
        other => Err(format!(
            "The {} backend is not compiled into this binary",
            backend_label(other)
        )
        .into()),
    }
}
