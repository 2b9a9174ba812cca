//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the services (clock, record storage, file
//! storage, the similarity scorer) sits behind a trait. This crate provides
//! in-memory implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically, including injected failures
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod files;
pub mod scorer;
pub mod store;

pub use clock::NullClock;
pub use files::NullFileStore;
pub use scorer::NullScorer;
pub use store::NullStore;
