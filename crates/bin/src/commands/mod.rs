use std::time::Duration;

use keeper::{
    KdfParams, client::KeeperClient, config::LEGACY_KDF_SALT, transport::HttpTransport,
};

use crate::cli::ClientArgs;

pub mod account;
pub mod health;
pub mod serve;
pub mod vault;

/// Build an HTTP client from the shared client flags.
fn connect(args: &ClientArgs) -> Result<KeeperClient<HttpTransport>, Box<dyn std::error::Error>> {
    let transport = HttpTransport::with_timeout(&args.server, Duration::from_secs(args.timeout))?;
    let salt = match &args.kdf_salt {
        Some(salt) => salt.as_bytes().to_vec(),
        None => LEGACY_KDF_SALT.to_vec(),
    };
    let kdf = KdfParams::new(salt, args.kdf_iterations);
    Ok(KeeperClient::new(transport).with_kdf_params(kdf))
}
