use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("keeper=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match &cli.command {
        Commands::Serve(args) => commands::serve::run(args).await,
        Commands::Health(args) => commands::health::run(args, format).await,
        Commands::Exists(args) => commands::account::exists(args, format).await,
        Commands::Register(args) => commands::account::register(args, format).await,
        Commands::Login(args) => commands::account::login(args, format).await,
        Commands::Save(args) => commands::vault::save(args, format).await,
        Commands::List(args) => commands::vault::list(args, format).await,
    }
}
