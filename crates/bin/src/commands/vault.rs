//! Vault commands: save and list.

use std::path::{Path, PathBuf};

use keeper::DataType;
use keeper::client::{Secret, Session};

use crate::cli::{ListArgs, SaveArgs, SecretArgs};
use crate::output::{OutputFormat, print_json, print_table};

use super::connect;

/// Encrypt a secret locally and store the ciphertext.
pub async fn save(args: &SaveArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let secret = match &args.secret {
        SecretArgs::Credentials { login, password } => Secret::credentials(login, password),
        SecretArgs::Text { text } => Secret::text(text),
        SecretArgs::Binary { path } => {
            let content = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| format!("{} does not name a file", path.display()))?;
            Secret::binary(file_name, content)
        }
        SecretArgs::Card {
            number,
            expiration,
            cvv,
        } => Secret::card(number, expiration, cvv),
    };

    let client = connect(&args.client)?;
    let session = Session::new(args.token.as_str())?;
    client.save(&session, &secret, args.metadata.as_str()).await?;

    let data_type = secret.data_type();
    match format {
        OutputFormat::Human => println!("Saved {data_type} entry"),
        OutputFormat::Json => print_json(&serde_json::json!({
            "saved": true,
            "data_type": data_type.as_str(),
            "metadata": args.metadata,
        }))?,
    }
    Ok(())
}

/// Fetch and decrypt every entry of one type.
pub async fn list(args: &ListArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let data_type = DataType::from(args.data_type);
    let client = connect(&args.client)?;
    let session = Session::new(args.token.as_str())?;
    let items = client.retrieve(&session, data_type).await?;

    let mut secrets = Vec::with_capacity(items.len());
    for item in &items {
        secrets.push((item.metadata.as_str(), item.secret()?));
    }

    if let Some(dir) = &args.output_dir {
        for (_, secret) in &secrets {
            if let Secret::Binary { file_name, content } = secret {
                let path = binary_destination(dir, file_name)?;
                tokio::fs::write(&path, content).await?;
                tracing::info!("Wrote {}", path.display());
            }
        }
    }

    match format {
        OutputFormat::Human => {
            if secrets.is_empty() {
                println!("No {data_type} entries");
                return Ok(());
            }
            let (headers, rows) = table_for(data_type, &secrets);
            print_table(&headers, &rows);
        }
        OutputFormat::Json => {
            let entries = secrets
                .iter()
                .map(|(metadata, secret)| {
                    serde_json::json!({
                        "metadata": metadata,
                        "secret": secret,
                    })
                })
                .collect::<Vec<_>>();
            print_json(&serde_json::json!({
                "data_type": data_type.as_str(),
                "entries": entries,
            }))?;
        }
    }
    Ok(())
}

/// Keep only the final path component so a stored name cannot escape `dir`.
fn binary_destination(dir: &Path, file_name: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let name = Path::new(file_name)
        .file_name()
        .ok_or_else(|| format!("Stored file name {file_name:?} is not usable"))?;
    Ok(dir.join(name))
}

fn table_for(data_type: DataType, secrets: &[(&str, Secret)]) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let headers = match data_type {
        DataType::Credentials => vec!["METADATA", "LOGIN", "PASSWORD"],
        DataType::Text => vec!["METADATA", "TEXT"],
        DataType::Binary => vec!["METADATA", "FILE", "BYTES"],
        DataType::Card => vec!["METADATA", "NUMBER", "EXPIRES", "CVV"],
    };
    let rows = secrets
        .iter()
        .map(|(metadata, secret)| {
            let mut row = vec![metadata.to_string()];
            match secret {
                Secret::Credentials { login, password } => {
                    row.extend([login.clone(), password.clone()])
                }
                Secret::Text { text } => row.push(text.clone()),
                Secret::Binary { file_name, content } => {
                    row.extend([file_name.clone(), content.len().to_string()])
                }
                Secret::Card {
                    number,
                    expiration,
                    cvv,
                } => row.extend([number.clone(), expiration.clone(), cvv.clone()]),
            }
            row
        })
        .collect();
    (headers, rows)
}
