//! LMDB and filesystem storage backend for the signature verification service.
//!
//! Implements the record-store traits from `sigver-store` using the `heed`
//! LMDB bindings. Each logical store maps to one or more LMDB databases
//! within a single environment. Image bytes go to a plain directory through
//! [`DiskFileStore`].

pub mod environment;
pub mod error;
pub mod files;
pub mod history;
pub mod keys;
pub mod migration;
pub mod session;
pub mod signature;
pub mod user;

pub use environment::{LmdbEnvironment, DATABASE_COUNT, DEFAULT_MAP_SIZE};
pub use error::LmdbError;
pub use files::DiskFileStore;
pub use history::LmdbHistoryStore;
pub use session::LmdbSessionStore;
pub use signature::LmdbSignatureStore;
pub use user::LmdbUserStore;
