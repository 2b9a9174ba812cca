//! Credential service for the signature verification service.
//!
//! - **Bearer tokens**: `hex(claims_json).hex(hmac_sha256)`, bound to a user
//!   and a session, 30-day validity by default
//! - **Passwords**: Argon2id with a random salt, stored as a PHC string

pub mod error;
pub mod password;
pub mod token;

pub use error::CredentialError;
pub use password::{hash_password, verify_password};
pub use token::{generate_secret, Claims, CredentialService, IssuedToken, DEFAULT_TOKEN_TTL_DAYS};
