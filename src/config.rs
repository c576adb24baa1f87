//! Command line and environment configuration
//!
//! Every option can come from a flag or an environment variable. A `.env`
//! file in the working directory is loaded first, so deployments can keep
//! the VAPID keys next to the binary.

use crate::push::{VapidCredentials, VapidError, DEFAULT_TTL_SECS};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting {0} (flag or environment variable)")]
    Missing(&'static str),

    #[error(transparent)]
    Vapid(#[from] VapidError),

    #[error("Invalid CORS origin '{0}'")]
    InvalidOrigin(String),

    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to load {path}: {reason}")]
    EnvFile { path: String, reason: String },
}

/// push-relay - fan Web Push notifications out to browser subscribers
#[derive(Parser, Debug)]
#[command(name = "push-relay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// VAPID public key, base64url encoded
    #[arg(long, env = "VAPID_PUBLIC_KEY", hide_env_values = true)]
    pub vapid_public_key: Option<String>,

    /// VAPID private key, base64url encoded
    #[arg(long, env = "VAPID_PRIVATE_KEY", hide_env_values = true)]
    pub vapid_private_key: Option<String>,

    /// Contact address sent as the VAPID `sub` claim
    #[arg(long, env = "VAPID_EMAIL")]
    pub vapid_email: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Address to bind to
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind: String,

    /// Comma-separated origins allowed to call the API (any origin if empty)
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Message returned by `GET /`
    #[arg(long, env = "MY_VARIABLE")]
    pub greeting: Option<String>,

    /// Seconds the push service may hold an undelivered message
    #[arg(long, env = "PUSH_TTL", default_value_t = DEFAULT_TTL_SECS)]
    pub ttl: u32,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print a fresh VAPID key pair as environment assignments and exit
    GenerateVapidKeys,
}

/// Validated settings for running the relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub credentials: VapidCredentials,
    pub bind: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub greeting: Option<String>,
    pub ttl: u32,
}

impl RelayConfig {
    /// Build the relay settings from parsed arguments, checking the VAPID keys
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let public_key = cli
            .vapid_public_key
            .clone()
            .ok_or(ConfigError::Missing("VAPID_PUBLIC_KEY"))?;
        let private_key = cli
            .vapid_private_key
            .clone()
            .ok_or(ConfigError::Missing("VAPID_PRIVATE_KEY"))?;
        let email = cli
            .vapid_email
            .as_deref()
            .ok_or(ConfigError::Missing("VAPID_EMAIL"))?;

        let credentials = VapidCredentials::new(public_key, private_key, email);
        credentials.validate()?;

        let cors_origins = cli
            .cors_origins
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            credentials,
            bind: cli.bind.clone(),
            port: cli.port,
            cors_origins,
            greeting: cli.greeting.clone(),
            ttl: cli.ttl,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidAddress(format!("{}:{}: {}", self.bind, self.port, e)))
    }
}

/// Load `.env` from the working directory if there is one.
///
/// Returns the path that was loaded. Runs before logging is set up, so the
/// caller reports the outcome.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    let dir = std::env::current_dir().map_err(|e| ConfigError::EnvFile {
        path: ".env".to_string(),
        reason: e.to_string(),
    })?;
    load_dotenv_from(&dir)
}

/// Load `<dir>/.env` if it exists. Variables already set are not overridden.
pub fn load_dotenv_from(dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let path = dir.join(".env");
    if !path.is_file() {
        return Ok(None);
    }

    dotenvy::from_path(&path).map_err(|e| ConfigError::EnvFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(path))
}
