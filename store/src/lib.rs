//! Abstract storage traits for the signature verification service.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.
//!
//! No transaction spans two traits: a caller that writes a signature and
//! then appends history must tolerate the second write failing.

pub mod error;
pub mod file;
pub mod history;
pub mod session;
pub mod signature;
pub mod user;

pub use error::StoreError;
pub use file::FileStore;
pub use history::HistoryStore;
pub use session::SessionStore;
pub use signature::SignatureStore;
pub use user::UserStore;
