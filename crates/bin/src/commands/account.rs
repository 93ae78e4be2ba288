//! Account commands: exists, register, login.

use crate::cli::{ExistsArgs, LoginArgs, RegisterArgs};
use crate::output::{OutputFormat, print_json};

use super::connect;

/// Report whether a username is taken.
pub async fn exists(args: &ExistsArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let client = connect(&args.client)?;
    let exists = client.user_exists(&args.username).await?;

    match format {
        OutputFormat::Human if exists => println!("{} is taken", args.username),
        OutputFormat::Human => println!("{} is available", args.username),
        OutputFormat::Json => print_json(&serde_json::json!({
            "username": args.username,
            "exists": exists,
        }))?,
    }
    Ok(())
}

/// Create an account and print its session token.
pub async fn register(
    args: &RegisterArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = connect(&args.client)?;
    let session = client
        .sign_up(&args.username, &args.password, &args.seed)
        .await?;
    tracing::info!(username = %args.username, "Registered");
    print_token(&args.username, session.token(), format)
}

/// Log in and print a session token.
pub async fn login(args: &LoginArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let client = connect(&args.client)?;
    let session = client.authenticate(&args.username, &args.password).await?;
    print_token(&args.username, session.token(), format)
}

fn print_token(
    username: &str,
    token: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => {
            eprintln!("Logged in as {username}. Export the token to use it:");
            println!("export KEEPER_TOKEN={token}");
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "username": username,
            "token": token,
        }))?,
    }
    Ok(())
}
