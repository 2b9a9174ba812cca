//! Opaque bearer tokens bound to a user and a session.
//!
//! Wire form: `hex(claims_json) "." hex(HMAC-SHA256(secret, hex(claims_json)))`.
//! The claims are not encrypted; the MAC only makes them tamper-evident.

use std::sync::Arc;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::Duration;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use sigver_types::{Clock, SessionId, UserId};

use crate::CredentialError;

type HmacSha256 = Hmac<Sha256>;

/// Token validity used when none is configured.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

/// Claims carried inside a bearer token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub sub: UserId,
    /// The login session the token belongs to.
    pub sid: SessionId,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds. The token is invalid at and after this instant.
    pub exp: i64,
}

/// A freshly issued token together with the claims it encodes.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Issues and validates bearer tokens.
pub struct CredentialService {
    secret: Vec<u8>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CredentialService {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: secret.into(),
            ttl,
            clock,
        }
    }

    /// Build a service with the default 30-day validity.
    pub fn with_default_ttl(secret: impl Into<Vec<u8>>, clock: Arc<dyn Clock>) -> Self {
        Self::new(secret, Duration::days(DEFAULT_TOKEN_TTL_DAYS), clock)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user` under a new session id.
    pub fn issue(&self, user: UserId) -> Result<IssuedToken, CredentialError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user,
            sid: SessionId::generate(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let json = serde_json::to_vec(&claims).map_err(|_| CredentialError::Malformed)?;
        let payload = hex::encode(json);
        let tag = self.mac(payload.as_bytes())?.finalize().into_bytes();
        Ok(IssuedToken {
            token: format!("{payload}.{}", hex::encode(tag)),
            claims,
        })
    }

    /// Validate a token and return its claims.
    ///
    /// Fails with [`CredentialError::Malformed`] for anything that is not a
    /// well-formed token, [`CredentialError::Tampered`] when the MAC does not
    /// match and [`CredentialError::Expired`] once `exp` has passed.
    pub fn validate(&self, token: &str) -> Result<Claims, CredentialError> {
        let (payload, tag_hex) = token.split_once('.').ok_or(CredentialError::Malformed)?;
        let tag = hex::decode(tag_hex).map_err(|_| CredentialError::Malformed)?;

        self.mac(payload.as_bytes())?
            .verify_slice(&tag)
            .map_err(|_| CredentialError::Tampered)?;

        let json = hex::decode(payload).map_err(|_| CredentialError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&json).map_err(|_| CredentialError::Malformed)?;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(CredentialError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self, payload: &[u8]) -> Result<HmacSha256, CredentialError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| CredentialError::Key(e.to_string()))?;
        mac.update(payload);
        Ok(mac)
    }
}

/// Generate a random 32-byte signing secret.
pub fn generate_secret() -> Vec<u8> {
    let mut secret = vec![0u8; 32];
    OsRng.fill_bytes(&mut secret);
    secret
}
