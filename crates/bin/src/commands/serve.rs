//! Serve command - runs the Keeper RPC server.

use std::{sync::Arc, time::Duration};

use keeper::{
    SecurityConfig, SigningKeys,
    config::MAX_TOKEN_TTL,
    service::KeeperService,
    transport::http::{API_PATH, HEALTH_PATH, serve},
};
use tokio::net::TcpListener;

use crate::backend::{backend_label, create_backend};
use crate::cli::ServeArgs;

/// Run the Keeper server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = security_config(args)?;
    let backend = create_backend(args).await?;
    let service = Arc::new(KeeperService::new(backend, &config));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        address = %local_addr,
        backend = backend_label(args.backend),
        token_ttl_hours = args.token_ttl_hours,
        "Keeper server started"
    );

    println!("Keeper server listening on http://{local_addr}");
    println!();
    println!("Available endpoints:");
    println!("  POST {API_PATH}       - Keeper RPC endpoint");
    println!("  GET  {HEALTH_PATH}       - Health check");
    println!();
    println!("Press Ctrl+C to shutdown");

    serve(listener, service, shutdown_signal()).await?;

    println!("Server shut down");
    Ok(())
}

/// Build the token signing configuration from flags.
fn security_config(args: &ServeArgs) -> Result<SecurityConfig, Box<dyn std::error::Error>> {
    if args.token_ttl_hours == 0 {
        return Err("--token-ttl-hours must be at least 1".into());
    }
    let previous: Vec<&String> = args
        .previous_signing_secrets
        .iter()
        .filter(|secret| !secret.is_empty())
        .collect();

    let keys = match &args.signing_secret {
        Some(secret) => {
            let mut keys = SigningKeys::new(secret.as_bytes())?;
            for old in &previous {
                keys = keys.with_previous(old.as_bytes())?;
            }
            keys
        }
        None if !previous.is_empty() => {
            return Err(
                "--previous-signing-secrets requires --signing-secret to be set as well".into(),
            );
        }
        None => {
            tracing::warn!(
                "No signing secret configured; using a random one. \
                 Session tokens will not survive a restart."
            );
            SigningKeys::generate()
        }
    };

    let ttl = args
        .token_ttl_hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .filter(|ttl| *ttl <= MAX_TOKEN_TTL)
        .ok_or_else(|| {
            format!(
                "--token-ttl-hours must be at most {}",
                MAX_TOKEN_TTL.as_secs() / (60 * 60)
            )
        })?;
    Ok(SecurityConfig::new(keys).with_token_ttl(ttl))
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
        _ = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
