//! CLI argument definitions for the Keeper binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use keeper::DataType;

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// SQLite database file (default)
    Sqlite,
    /// PostgreSQL database
    Postgres,
    /// In-memory, lost on restart (for development)
    Inmemory,
}

/// Vault entry category, as accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DataTypeArg {
    Credentials,
    Text,
    Binary,
    Card,
}

impl From<DataTypeArg> for DataType {
    fn from(arg: DataTypeArg) -> Self {
        match arg {
            DataTypeArg::Credentials => DataType::Credentials,
            DataTypeArg::Text => DataType::Text,
            DataTypeArg::Binary => DataType::Binary,
            DataTypeArg::Card => DataType::Card,
        }
    }
}

/// Keeper: a secret vault whose server only ever stores ciphertext
#[derive(Parser, Debug)]
#[command(name = "keeper")]
#[command(version)]
pub struct Cli {
    /// Print machine-readable JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Keeper server
    Serve(ServeArgs),
    /// Check health of a running Keeper server
    Health(HealthArgs),
    /// Check whether a username is taken
    Exists(ExistsArgs),
    /// Create an account and print its session token
    Register(RegisterArgs),
    /// Log in and print a session token
    Login(LoginArgs),
    /// Encrypt a secret locally and store it
    Save(SaveArgs),
    /// Fetch and decrypt every secret of one type
    List(ListArgs),
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 50051, env = "KEEPER_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "KEEPER_HOST")]
    pub host: String,

    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "KEEPER_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores keeper.db
    #[arg(short = 'D', long, env = "KEEPER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "KEEPER_POSTGRES_URL")]
    pub postgres_url: Option<String>,

    /// Secret used to sign new session tokens (at least 32 bytes).
    /// A random one is generated when absent; tokens then die with the process.
    #[arg(long, env = "KEEPER_SIGNING_SECRET", hide_env_values = true)]
    pub signing_secret: Option<String>,

    /// Older signing secrets still accepted during a rotation window
    #[arg(
        long,
        env = "KEEPER_PREVIOUS_SIGNING_SECRETS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub previous_signing_secrets: Vec<String>,

    /// Session token lifetime in hours
    #[arg(long, default_value_t = 24, env = "KEEPER_TOKEN_TTL_HOURS")]
    pub token_ttl_hours: u64,
}

/// Arguments for the health command
#[derive(Args, Debug)]
pub struct HealthArgs {
    #[command(flatten)]
    pub client: ClientArgs,
}

/// Connection and key-derivation settings shared by client commands
#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Base URL of the Keeper server
    #[arg(short, long, default_value = "http://127.0.0.1:50051", env = "KEEPER_SERVER")]
    pub server: String,

    /// Per-call timeout in seconds
    #[arg(short, long, default_value_t = 5, env = "KEEPER_TIMEOUT")]
    pub timeout: u64,

    /// Salt for deriving the encryption key from the master seed
    #[arg(long, env = "KEEPER_KDF_SALT")]
    pub kdf_salt: Option<String>,

    /// PBKDF2 iteration count
    #[arg(long, default_value_t = 4096, env = "KEEPER_KDF_ITERATIONS")]
    pub kdf_iterations: u32,
}

/// Arguments for the exists command
#[derive(Args, Debug)]
pub struct ExistsArgs {
    pub username: String,

    #[command(flatten)]
    pub client: ClientArgs,
}

/// Arguments for the register command
#[derive(Args, Debug)]
pub struct RegisterArgs {
    pub username: String,

    #[arg(long, env = "KEEPER_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Master seed the encryption key is derived from. Keep it safe.
    #[arg(long, env = "KEEPER_SEED", hide_env_values = true)]
    pub seed: String,

    #[command(flatten)]
    pub client: ClientArgs,
}

/// Arguments for the login command
#[derive(Args, Debug)]
pub struct LoginArgs {
    pub username: String,

    #[arg(long, env = "KEEPER_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[command(flatten)]
    pub client: ClientArgs,
}

/// Arguments for the save command
#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Session token from `register` or `login`
    #[arg(long, env = "KEEPER_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Plaintext label stored next to the encrypted entry
    #[arg(short, long, default_value = "")]
    pub metadata: String,

    #[command(flatten)]
    pub client: ClientArgs,

    #[command(subcommand)]
    pub secret: SecretArgs,
}

#[derive(Subcommand, Debug)]
pub enum SecretArgs {
    /// A login/password pair
    Credentials { login: String, password: String },
    /// Free-form text
    Text { text: String },
    /// The contents of a file
    Binary { path: PathBuf },
    /// Payment card details
    Card {
        number: String,
        expiration: String,
        cvv: String,
    },
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    pub data_type: DataTypeArg,

    /// Session token from `register` or `login`
    #[arg(long, env = "KEEPER_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Directory to write binary entries to instead of printing their size
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub client: ClientArgs,
}
