//! Signature verification workflow.
//!
//! Two services sit on top of the storage traits:
//! - [`SignatureService`]: reference uploads, verification against the newest
//!   reference through the external scorer, the per-user history log, and
//!   owner-only lookup and deletion of signatures.
//! - [`AccountService`]: registration, login, bearer-session
//!   authentication, profile, logout and the admin user listing.
//!
//! Both depend only on traits, so tests run them against
//! `sigver-nullables` and production against LMDB.

pub mod accounts;
pub mod error;
pub mod signatures;
pub mod stores;
pub mod upload;

pub use accounts::{AccountService, AuthOutcome, Profile, Registration, Session};
pub use error::{ErrorKind, ServiceError};
pub use signatures::{
    PendingVerification, SignatureService, FALLBACK_MATCH_SCORE, FALLBACK_MISMATCH_SCORE,
};
pub use stores::Stores;
pub use upload::Upload;
