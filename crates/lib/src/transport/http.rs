//! HTTP transport.
//!
//! A single JSON endpoint (`POST /api/v0`) with axum for the server and
//! reqwest for the client, plus `GET /health` for liveness probes.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    extract::{Json as ExtractJson, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{DEFAULT_TIMEOUT, KeeperTransport};
use crate::Result;
use crate::client::ClientError;
use crate::protocol::{KeeperRequest, KeeperResponse, ServerFault, messages};
use crate::service::KeeperService;

/// Path of the RPC endpoint.
pub const API_PATH: &str = "/api/v0";

/// Path of the liveness probe.
pub const HEALTH_PATH: &str = "/health";

/// Create the axum router serving `service`.
pub fn router(service: Arc<KeeperService>) -> Router {
    Router::new()
        .route(API_PATH, post(handle_request))
        .route(HEALTH_PATH, get(health))
        .with_state(service)
}

/// Handler for the /api/v0 endpoint - accepts a JSON `KeeperRequest` and returns a JSON `KeeperResponse`.
async fn handle_request(
    State(service): State<Arc<KeeperService>>,
    ExtractJson(request): ExtractJson<KeeperRequest>,
) -> Response {
    match service.handle(request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            error!(error = %e, "Request failed");
            let fault = ServerFault {
                message: messages::INTERNAL_ERROR.to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(fault)).into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Serve `service` on an already-bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    service: Arc<KeeperService>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// A running HTTP server, stopped by [`HttpServer::shutdown`] or on drop.
pub struct HttpServer {
    address: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl HttpServer {
    /// Bind `addr` and start serving in a background task.
    ///
    /// Port 0 picks a free port; read it back with [`HttpServer::local_addr`].
    pub async fn start(addr: &str, service: Arc<KeeperService>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let address = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = serve(listener, service, shutdown).await {
                error!(error = %e, "HTTP server failed");
            }
        });

        info!(%address, "HTTP server listening");
        Ok(Self {
            address,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// Base URL clients should use, e.g. `http://127.0.0.1:50051`.
    pub fn url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Client side of the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Talk to the server at `base_url` with the default 5 second timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout {
                after: self.timeout,
            }
        } else {
            ClientError::Transport {
                reason: e.to_string(),
            }
        }
    }

    /// Probe `GET /health`. Returns `true` when the server reports healthy.
    pub async fn health(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}{HEALTH_PATH}", self.base_url))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        if !response.status().is_success() {
            return Ok(false);
        }
        let body: serde_json::Value = response.json().await.map_err(|e| self.request_error(e))?;
        Ok(body.get("status").and_then(|s| s.as_str()) == Some("healthy"))
    }
}

#[async_trait]
impl KeeperTransport for HttpTransport {
    async fn call(&self, request: KeeperRequest) -> Result<KeeperResponse> {
        let response = self
            .client
            .post(format!("{}{API_PATH}", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR {
            let message = response
                .json::<ServerFault>()
                .await
                .map(|fault| fault.message)
                .unwrap_or_else(|_| messages::INTERNAL_ERROR.to_string());
            return Err(ClientError::Server { message }.into());
        }
        if !status.is_success() {
            return Err(ClientError::Transport {
                reason: format!("Server returned error: {status}"),
            }
            .into());
        }

        let response = response
            .json::<KeeperResponse>()
            .await
            .map_err(|e| self.request_error(e))?;
        Ok(response)
    }
}
