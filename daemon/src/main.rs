//! Signature verification daemon: entry point for running a node.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sigver_node::{init_logging, LogFormat, NodeConfig, SigverNode};

#[derive(Parser)]
#[command(name = "sigver-daemon", about = "Signature verification service daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "SIGVER_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

/// Per-setting overrides; every field left unset keeps the file value.
#[derive(clap::Args)]
struct Overrides {
    /// Address the HTTP API binds to.
    #[arg(long, env = "SIGVER_LISTEN_ADDR")]
    listen_addr: Option<IpAddr>,

    /// HTTP API port.
    #[arg(long, env = "SIGVER_PORT")]
    port: Option<u16>,

    /// Data directory for the LMDB environment.
    #[arg(long, env = "SIGVER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory for uploaded images (defaults to <data-dir>/uploads).
    #[arg(long, env = "SIGVER_UPLOADS_DIR")]
    uploads_dir: Option<PathBuf>,

    /// Base URL of the similarity scorer, e.g. "http://127.0.0.1:8000".
    #[arg(long, env = "SIGVER_SCORER_URL")]
    scorer_url: Option<String>,

    /// Scorer request timeout in seconds.
    #[arg(long, env = "SIGVER_SCORER_TIMEOUT_SECS")]
    scorer_timeout_secs: Option<u64>,

    /// HMAC key for bearer tokens.
    #[arg(long, env = "SIGVER_TOKEN_SECRET", hide_env_values = true)]
    token_secret: Option<String>,

    /// Bearer token lifetime in days.
    #[arg(long, env = "SIGVER_TOKEN_TTL_DAYS")]
    token_ttl_days: Option<i64>,

    /// Largest accepted request body in bytes.
    #[arg(long, env = "SIGVER_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// LMDB map size in bytes.
    #[arg(long, env = "SIGVER_LMDB_MAP_SIZE")]
    lmdb_map_size: Option<usize>,

    /// Restrict CORS instead of allowing any origin.
    #[arg(long, env = "SIGVER_STRICT_CORS")]
    strict_cors: bool,

    /// Emails that become admins on registration (comma-separated).
    #[arg(long, env = "SIGVER_ADMIN_EMAILS", value_delimiter = ',')]
    admin_emails: Vec<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SIGVER_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SIGVER_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the node until SIGINT or SIGTERM.
    Run,
    /// Print the effective configuration as TOML and exit.
    Config,
}

impl Overrides {
    /// Layer flags and env vars over `base`.
    fn apply(self, base: NodeConfig) -> NodeConfig {
        NodeConfig {
            listen_addr: self.listen_addr.unwrap_or(base.listen_addr),
            port: self.port.unwrap_or(base.port),
            data_dir: self.data_dir.unwrap_or(base.data_dir),
            uploads_dir: self.uploads_dir.or(base.uploads_dir),
            scorer_url: self.scorer_url.unwrap_or(base.scorer_url),
            scorer_timeout_secs: self.scorer_timeout_secs.unwrap_or(base.scorer_timeout_secs),
            token_secret: self.token_secret.or(base.token_secret),
            token_ttl_days: self.token_ttl_days.unwrap_or(base.token_ttl_days),
            max_upload_bytes: self.max_upload_bytes.unwrap_or(base.max_upload_bytes),
            lmdb_map_size: self.lmdb_map_size.unwrap_or(base.lmdb_map_size),
            cors_allow_any: base.cors_allow_any && !self.strict_cors,
            log_format: self.log_format.unwrap_or(base.log_format),
            log_level: self.log_level.unwrap_or(base.log_level),
            admin_emails: if self.admin_emails.is_empty() {
                base.admin_emails
            } else {
                self.admin_emails
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    let config = cli.overrides.apply(base);

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
        Command::Run => {
            init_logging(config.log_format, &config.log_level);
            if let Some(path) = &cli.config {
                tracing::info!(path = %path.display(), "loaded config file");
            }
            tracing::info!(
                addr = %config.socket_addr(),
                data_dir = %config.data_dir.display(),
                scorer = %config.scorer_url,
                "starting signature verification node"
            );

            let node = SigverNode::new(config).context("starting node")?;
            node.run().await?;

            tracing::info!("daemon exited cleanly");
        }
    }

    Ok(())
}
