//! Registered users and their roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::UserId;
use crate::signature::StorageLocator;

/// Authorization role of a user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Standard,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "standard",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered user as persisted by the user store.
///
/// `password_hash` is an Argon2 PHC string and must never leave the
/// service layer; use [`PublicUser`] for anything sent to a client.
/// Reference signatures and verification history are not embedded here:
/// they live in their own stores keyed by [`UserId`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Normalised (trimmed, lowercase) email. Unique across users.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub profile_picture: Option<StorageLocator>,
    /// Signature image supplied at registration, kept as a profile field.
    pub original_signature: Option<StorageLocator>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Canonical form used for the unique email index.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub fn public(&self) -> PublicUser {
        PublicUser::from(self)
    }
}

/// The client-safe projection of a [`User`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
