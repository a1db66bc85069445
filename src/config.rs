use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{env, path::PathBuf};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Object-store settings the gateway needs before it may touch the store.
#[derive(Clone, Default)]
pub struct StoreSettings {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl StoreSettings {
    /// Names of the required settings that are absent, in a fixed order.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("AWS_S3_BUCKET", self.bucket.is_none()),
            ("AWS_REGION", self.region.is_none()),
            ("AWS_ACCESS_KEY_ID", self.access_key_id.is_none()),
            ("AWS_SECRET_ACCESS_KEY", self.secret_access_key.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect()
    }

    pub fn region_or_default(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }
}

// Secrets stay out of `{:?}` output, which is logged at startup.
impl std::fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSettings")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("has_access_key", &self.access_key_id.is_some())
            .field("has_secret", &self.secret_access_key.is_some())
            .finish()
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub gateway_url: String,
    pub store: StoreSettings,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Keyword-tagged image gateway over S3")]
pub struct Args {
    /// Host to bind to (overrides HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Upload size limit in bytes (overrides MAX_UPLOAD_BYTES)
    #[arg(long, global = true)]
    pub max_upload_bytes: Option<usize>,

    /// Bucket name (overrides AWS_S3_BUCKET)
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Bucket region (overrides AWS_REGION)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Base URL of a running gateway, used by the client commands (overrides GATEWAY_URL)
    #[arg(long, global = true)]
    pub gateway_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP gateway (default)
    Serve,
    /// Upload an image through a running gateway
    Upload {
        /// Image file to upload
        #[arg(long)]
        file: Option<PathBuf>,
        /// Comma-separated keywords
        #[arg(long, default_value = "")]
        keywords: String,
    },
    /// List images whose keywords contain the query
    Search {
        /// Keyword substring; omit to list everything
        query: Option<String>,
    },
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command to run.
    pub fn from_env_and_args() -> Result<(Self, Command)> {
        // Parse CLI once
        let args = Args::parse();
        Self::resolve(args, |name| env::var(name))
    }

    /// Merge CLI args over values produced by `lookup`.
    ///
    /// A variable that is present but empty counts as unset, except that an
    /// empty `AWS_REGION` does not fall back to the default region.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<(Self, Command)>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let var = |name: &str| lookup(name).ok().filter(|v| !v.is_empty());

        // --- Environment fallback ---
        let env_host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match var("PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PORT value `{}`", value))?,
            None => 4000,
        };
        let env_max_upload = match var("MAX_UPLOAD_BYTES") {
            Some(value) => value
                .parse::<usize>()
                .with_context(|| format!("parsing MAX_UPLOAD_BYTES value `{}`", value))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let env_region = match lookup("AWS_REGION") {
            Ok(value) if value.is_empty() => None,
            Ok(value) => Some(value),
            Err(env::VarError::NotPresent) => Some(DEFAULT_REGION.to_string()),
            Err(err) => return Err(err).context("reading AWS_REGION"),
        };
        let env_gateway_url =
            var("GATEWAY_URL").unwrap_or_else(|| "http://localhost:4000".into());

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
            gateway_url: args.gateway_url.unwrap_or(env_gateway_url),
            store: StoreSettings {
                bucket: args.bucket.filter(|b| !b.is_empty()).or_else(|| var("AWS_S3_BUCKET")),
                region: args.region.filter(|r| !r.is_empty()).or(env_region),
                access_key_id: var("AWS_ACCESS_KEY_ID"),
                secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            },
        };

        Ok((cfg, args.command.unwrap_or(Command::Serve)))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
