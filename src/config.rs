use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub spool_dir: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Web browser for an S3-compatible object store")]
pub struct Args {
    /// Host to bind to (overrides BUCKET_BROWSER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BUCKET_BROWSER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Object store endpoint URL (overrides BUCKET_BROWSER_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Object store region (overrides BUCKET_BROWSER_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Directory downloads are spooled through (overrides BUCKET_BROWSER_SPOOL_DIR)
    #[arg(long)]
    pub spool_dir: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into an AppConfig.
    ///
    /// Credentials come from the environment only; the defaults are the
    /// placeholder pair a LocalStack-style emulator accepts.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("BUCKET_BROWSER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("BUCKET_BROWSER_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing BUCKET_BROWSER_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading BUCKET_BROWSER_PORT"),
        };
        let env_endpoint =
            env::var("BUCKET_BROWSER_ENDPOINT").unwrap_or_else(|_| "http://localhost:4566".into());
        let env_region = env::var("BUCKET_BROWSER_REGION").unwrap_or_else(|_| "us-east-1".into());
        let access_key = env::var("BUCKET_BROWSER_ACCESS_KEY").unwrap_or_else(|_| "test".into());
        let secret_key = env::var("BUCKET_BROWSER_SECRET_KEY").unwrap_or_else(|_| "test".into());
        let env_spool =
            env::var("BUCKET_BROWSER_SPOOL_DIR").unwrap_or_else(|_| "./data/spool".into());

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            endpoint: args.endpoint.unwrap_or(env_endpoint),
            region: args.region.unwrap_or(env_region),
            access_key,
            secret_key,
            spool_dir: args.spool_dir.unwrap_or(env_spool),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
