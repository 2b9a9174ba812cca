//! Shared utilities for the signature verification service.

pub mod logging;

pub use logging::{init_logging, LogFormat};
