//! Health check command - checks a running Keeper server.

use std::time::Duration;

use keeper::transport::HttpTransport;

use crate::cli::HealthArgs;
use crate::output::{OutputFormat, print_json};

/// Run the health check command
pub async fn run(args: &HealthArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let server = &args.client.server;
    let transport = HttpTransport::with_timeout(server, Duration::from_secs(args.client.timeout))?;

    let healthy = match transport.health().await {
        Ok(healthy) => healthy,
        Err(e) => {
            eprintln!("unhealthy: failed to connect to {server}: {e}");
            std::process::exit(1);
        }
    };

    match format {
        OutputFormat::Human if healthy => println!("healthy: {server}"),
        OutputFormat::Human => eprintln!("unhealthy: {server} did not report healthy"),
        OutputFormat::Json => print_json(&serde_json::json!({
            "server": server,
            "healthy": healthy,
        }))?,
    }

    if !healthy {
        std::process::exit(1);
    }
    Ok(())
}
