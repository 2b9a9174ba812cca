//! Fundamental types for the signature verification service.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: identifiers, users and roles, signature records, verification
//! history entries and the clock abstraction.

pub mod history;
pub mod ids;
pub mod signature;
pub mod time;
pub mod user;

pub use history::{HistoryEntryView, ScoreSource, VerificationRecord, VerificationResult};
pub use ids::{SessionId, SignatureId, UserId, VerificationId};
pub use signature::{
    content_type_for, SignatureRecord, StorageLocator, DEFAULT_PROBE_DESCRIPTION,
    DEFAULT_REFERENCE_DESCRIPTION,
};
pub use time::{Clock, SystemClock};
pub use user::{PublicUser, Role, User};
