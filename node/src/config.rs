//! Node configuration with TOML file support.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sigver_store_lmdb::DEFAULT_MAP_SIZE;
use sigver_utils::LogFormat;

use crate::NodeError;

const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Configuration for a signature verification node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: IpAddr,

    /// HTTP API port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Where uploaded images are kept. Defaults to `<data_dir>/uploads`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploads_dir: Option<PathBuf>,

    /// Base URL of the external similarity scorer.
    #[serde(default = "default_scorer_url")]
    pub scorer_url: String,

    /// Per-request timeout for the scorer.
    #[serde(default = "default_scorer_timeout_secs")]
    pub scorer_timeout_secs: u64,

    /// HMAC key for bearer tokens. When absent a random key is generated
    /// at startup and tokens do not survive a restart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,

    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,

    /// Largest accepted request body, uploads included.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// LMDB map size in bytes.
    #[serde(default = "default_lmdb_map_size")]
    pub lmdb_map_size: usize,

    /// Allow cross-origin requests from any origin.
    #[serde(default = "default_true")]
    pub cors_allow_any: bool,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Users registering with one of these emails become admins.
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    4000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./sigver_data")
}

fn default_scorer_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_scorer_timeout_secs() -> u64 {
    30
}

fn default_token_ttl_days() -> i64 {
    sigver_crypto::DEFAULT_TOKEN_TTL_DAYS
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_lmdb_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.port)
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.uploads_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("uploads"))
    }

    /// Reject values the node cannot start with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if !(self.scorer_url.starts_with("http://") || self.scorer_url.starts_with("https://")) {
            return Err(NodeError::Config(format!(
                "scorer_url must be an http(s) URL, got '{}'",
                self.scorer_url
            )));
        }
        if self.scorer_timeout_secs == 0 {
            return Err(NodeError::Config("scorer_timeout_secs must be positive".into()));
        }
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&self.token_ttl_days) {
            return Err(NodeError::Config(format!(
                "token_ttl_days must be between 1 and {MAX_TOKEN_TTL_DAYS}"
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(NodeError::Config("max_upload_bytes must be positive".into()));
        }
        if matches!(&self.token_secret, Some(s) if s.is_empty()) {
            return Err(NodeError::Config("token_secret must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            data_dir: default_data_dir(),
            uploads_dir: None,
            scorer_url: default_scorer_url(),
            scorer_timeout_secs: default_scorer_timeout_secs(),
            token_secret: None,
            token_ttl_days: default_token_ttl_days(),
            max_upload_bytes: default_max_upload_bytes(),
            lmdb_map_size: default_lmdb_map_size(),
            cors_allow_any: default_true(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            admin_emails: Vec::new(),
        }
    }
}
