//! Client-to-server transports.
//!
//! A [`KeeperTransport`] carries one [`KeeperRequest`] to a
//! [`KeeperService`](crate::service::KeeperService) and brings back its
//! [`KeeperResponse`]. Every call runs under a fixed timeout and is never
//! retried; a timeout is a terminal [`ClientError::Timeout`].
//!
//! - [`HttpTransport`]: JSON over HTTP (`POST /api/v0`), with [`router`]
//!   and [`HttpServer`] for the serving side
//! - [`LocalTransport`]: calls the service in-process

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::protocol::{KeeperRequest, KeeperResponse};

pub mod http;
pub mod local;

pub use http::{HttpServer, HttpTransport, router};
pub use local::LocalTransport;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Carries requests to a Keeper server.
#[async_trait]
pub trait KeeperTransport: Send + Sync {
    /// Send `request` and wait for the answer.
    ///
    /// Fails with a transport-kind [`ClientError`](crate::client::ClientError)
    /// when no answer arrives, and with `ClientError::Server` when the server
    /// reports an internal fault.
    async fn call(&self, request: KeeperRequest) -> Result<KeeperResponse>;
}
