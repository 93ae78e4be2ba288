use std::sync::Arc;

use keeper::{
    FixedClock, SecurityConfig, SigningKeys,
    backend::{InMemory, VaultBackend},
    client::{KeeperClient, Session},
    service::KeeperService,
    transport::LocalTransport,
};

/// Signing secret shared by every test service.
pub const TEST_SECRET: [u8; 32] = *b"keeper-integration-test-secret!!";

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
/// - "postgres": PostgreSQL backend (requires `postgres` feature and TEST_POSTGRES_URL)
///
/// # Example
/// ```bash
/// TEST_BACKEND=sqlite cargo test --features sqlite
/// ```
pub async fn test_backend(clock: Arc<FixedClock>) -> Arc<dyn VaultBackend> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use keeper::backend::SqlxBackend;
                Arc::new(
                    SqlxBackend::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite backend")
                        .with_clock(clock),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                use keeper::backend::SqlxBackend;
                let url = std::env::var("TEST_POSTGRES_URL")
                    .unwrap_or_else(|_| "postgres://localhost/keeper_test".to_string());
                Arc::new(
                    SqlxBackend::connect_postgres_isolated(&url)
                        .await
                        .expect("Failed to connect to PostgreSQL")
                        .with_clock(clock),
                )
            }
            #[cfg(not(feature = "postgres"))]
            {
                panic!("TEST_BACKEND=postgres requires the 'postgres' feature to be enabled")
            }
        }
        _ => Arc::new(InMemory::with_clock(clock)),
    }
}

pub fn test_security_config() -> SecurityConfig {
    SecurityConfig::new(SigningKeys::new(TEST_SECRET).expect("test secret is long enough"))
}

/// A service, its clock, and an in-process client wired together.
pub struct TestContext {
    pub clock: Arc<FixedClock>,
    pub service: Arc<KeeperService>,
    pub client: KeeperClient<LocalTransport>,
}

impl TestContext {
    pub async fn new() -> Self {
        let clock = Arc::new(FixedClock::default());
        let backend = test_backend(clock.clone()).await;
        let service = Arc::new(KeeperService::with_clock(
            backend,
            &test_security_config(),
            clock.clone(),
        ));
        let client = KeeperClient::new(LocalTransport::new(service.clone()));
        Self {
            clock,
            service,
            client,
        }
    }

    /// Register `login` with password "pw" and seed "seed-<login>".
    pub async fn register(&self, login: &str) -> Session {
        self.client
            .register(login, "pw", &format!("seed-{login}"))
            .await
            .expect("registration succeeds")
    }

    pub fn backend(&self) -> &Arc<dyn VaultBackend> {
        self.service.identity().backend()
    }
}
