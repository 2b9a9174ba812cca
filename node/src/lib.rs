//! Signature verification node.
//!
//! The node is the composition root that:
//! - Loads [`NodeConfig`] from TOML
//! - Opens the LMDB environment and the upload directory
//! - Connects the external scorer client
//! - Wires the account and signature services into the HTTP API
//! - Stops gracefully on SIGINT/SIGTERM

pub mod config;
pub mod error;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use node::SigverNode;
pub use shutdown::ShutdownController;
pub use sigver_utils::{init_logging, LogFormat};
