//! In-process transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::error;

use super::{DEFAULT_TIMEOUT, KeeperTransport};
use crate::Result;
use crate::client::ClientError;
use crate::protocol::{KeeperRequest, KeeperResponse, messages};
use crate::service::KeeperService;

/// Calls a [`KeeperService`] directly, with the same timeout and fault
/// mapping as the HTTP transport.
#[derive(Clone)]
pub struct LocalTransport {
    service: Arc<KeeperService>,
    timeout: Duration,
}

impl LocalTransport {
    pub fn new(service: Arc<KeeperService>) -> Self {
        Self {
            service,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn service(&self) -> &Arc<KeeperService> {
        &self.service
    }
}

#[async_trait]
impl KeeperTransport for LocalTransport {
    async fn call(&self, request: KeeperRequest) -> Result<KeeperResponse> {
        let outcome = tokio::time::timeout(self.timeout, self.service.handle(request))
            .await
            .map_err(|_| ClientError::Timeout {
                after: self.timeout,
            })?;

        // Internal detail stays on the server side, as over HTTP.
        outcome.map_err(|e| {
            error!(error = %e, "Request failed");
            ClientError::Server {
                message: messages::INTERNAL_ERROR.to_string(),
            }
            .into()
        })
    }
}
