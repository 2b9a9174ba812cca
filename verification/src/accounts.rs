//! Registration, login and bearer sessions.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sigver_crypto::{hash_password, verify_password, CredentialService, IssuedToken};
use sigver_store::StoreError;
use sigver_types::{Clock, PublicUser, Role, SessionId, SignatureId, StorageLocator, User, UserId};
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::stores::Stores;
use crate::upload::Upload;

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Registration input. Empty strings count as missing.
#[derive(Clone, Debug, Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub profile_picture: Option<Upload>,
    pub original_signature: Option<Upload>,
}

/// A user together with a freshly issued bearer token.
#[derive(Clone, Debug)]
pub struct AuthOutcome {
    pub user: User,
    pub token: IssuedToken,
}

/// An authenticated request context, resolved from a bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Everything the profile view shows about a user.
#[derive(Clone, Debug)]
pub struct Profile {
    pub user: User,
    pub profile_picture: Option<Vec<u8>>,
    pub original_signature: Option<Vec<u8>>,
    /// Ids of the user's reference signatures, newest first.
    pub signature_references: Vec<SignatureId>,
}

pub struct AccountService {
    stores: Stores,
    credentials: CredentialService,
    clock: Arc<dyn Clock>,
    admin_emails: HashSet<String>,
}

impl AccountService {
    pub fn new(stores: Stores, credentials: CredentialService, clock: Arc<dyn Clock>) -> Self {
        Self {
            stores,
            credentials,
            clock,
            admin_emails: HashSet::new(),
        }
    }

    /// Registrations with one of these emails get the admin role.
    pub fn with_admin_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.admin_emails = emails
            .into_iter()
            .map(|e| User::normalize_email(e.as_ref()))
            .collect();
        self
    }

    pub fn register(&self, registration: Registration) -> Result<AuthOutcome, ServiceError> {
        let username = registration.username.trim().to_string();
        let email = User::normalize_email(&registration.email);
        if username.is_empty() || email.is_empty() || registration.password.is_empty() {
            return Err(ServiceError::Validation(
                "Username, email and password are required".into(),
            ));
        }
        if registration.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.stores.users.find_by_email(&email)?.is_some() {
            return Err(ServiceError::UserExists);
        }

        let id = UserId::generate();
        let now = self.clock.now();
        let password_hash = hash_password(&registration.password)?;
        let role = if self.admin_emails.contains(&email) {
            Role::Admin
        } else {
            Role::Standard
        };

        let profile_picture =
            self.store_profile_file("avatar-", &id, now, registration.profile_picture.as_ref())?;
        let original_signature = match self.store_profile_file(
            "original-",
            &id,
            now,
            registration.original_signature.as_ref(),
        ) {
            Ok(locator) => locator,
            Err(e) => {
                self.discard_files([profile_picture.as_ref()]);
                return Err(e);
            }
        };

        let user = User {
            id,
            username,
            email,
            password_hash,
            role,
            profile_picture,
            original_signature,
            created_at: now,
            last_login: Some(now),
        };
        if let Err(e) = self.stores.users.create_user(&user) {
            self.discard_files([user.profile_picture.as_ref(), user.original_signature.as_ref()]);
            return Err(match e {
                StoreError::Duplicate(_) => ServiceError::UserExists,
                other => other.into(),
            });
        }

        let token = self.credentials.issue(user.id)?;
        info!(user_id = %user.id, role = user.role.as_str(), "user registered");
        Ok(AuthOutcome { user, token })
    }

    /// Unknown email and wrong password fail identically.
    pub fn login(&self, email: &str, password: &str) -> Result<AuthOutcome, ServiceError> {
        let Some(mut user) = self.stores.users.find_by_email(email)? else {
            debug!("login for unknown email");
            return Err(ServiceError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash) {
            debug!(user_id = %user.id, "login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        user.last_login = Some(self.clock.now());
        self.stores.users.update_user(&user)?;

        let token = self.credentials.issue(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(AuthOutcome { user, token })
    }

    /// Resolve a bearer token into a live session.
    pub fn authenticate(&self, token: &str) -> Result<Session, ServiceError> {
        let claims = self.credentials.validate(token)?;
        if self.stores.sessions.is_revoked(&claims.sid)? {
            return Err(ServiceError::InvalidCredential("session revoked".into()));
        }
        let user = match self.stores.users.get_user(&claims.sub) {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => {
                return Err(ServiceError::InvalidCredential("user no longer exists".into()))
            }
            Err(e) => return Err(e.into()),
        };
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| ServiceError::InvalidCredential("expiry out of range".into()))?;

        Ok(Session {
            user_id: user.id,
            session_id: claims.sid,
            role: user.role,
            expires_at,
        })
    }

    /// Revoke the session until its token would have expired anyway.
    pub fn logout(&self, session: &Session) -> Result<(), ServiceError> {
        self.stores
            .sessions
            .revoke_session(&session.session_id, session.expires_at)?;
        match self.stores.sessions.purge_expired(self.clock.now()) {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "dropped expired revocations"),
            Err(e) => warn!(error = %e, "could not purge expired revocations"),
        }
        info!(user_id = %session.user_id, "user logged out");
        Ok(())
    }

    pub fn profile(&self, session: &Session) -> Result<Profile, ServiceError> {
        let user = match self.stores.users.get_user(&session.user_id) {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => return Err(ServiceError::UserNotFound),
            Err(e) => return Err(e.into()),
        };
        let signature_references = self
            .stores
            .signatures
            .signatures_for_owner(&user.id, true)?
            .into_iter()
            .map(|s| s.id)
            .collect();

        Ok(Profile {
            profile_picture: self.read_optional(user.profile_picture.as_ref()),
            original_signature: self.read_optional(user.original_signature.as_ref()),
            signature_references,
            user,
        })
    }

    /// Every user's public projection. Admins only.
    pub fn list_users(&self, session: &Session) -> Result<Vec<PublicUser>, ServiceError> {
        if !session.role.is_admin() {
            return Err(ServiceError::Forbidden);
        }
        let users = self.stores.users.list_users()?;
        Ok(users.iter().map(User::public).collect())
    }

    fn store_profile_file(
        &self,
        prefix: &str,
        owner: &UserId,
        at: DateTime<Utc>,
        upload: Option<&Upload>,
    ) -> Result<Option<StorageLocator>, ServiceError> {
        let Some(upload) = upload.filter(|u| !u.is_empty()) else {
            return Ok(None);
        };
        let filename = format!(
            "{prefix}{owner}-{}{}",
            at.timestamp_millis(),
            upload.extension()
        );
        Ok(Some(self.stores.files.put_file(&filename, &upload.bytes)?))
    }

    fn discard_files<'a>(&self, locators: impl IntoIterator<Item = Option<&'a StorageLocator>>) {
        for locator in locators.into_iter().flatten() {
            if let Err(e) = self.stores.files.delete_file(locator) {
                warn!(file = %locator.filename, error = %e, "could not remove orphaned upload");
            }
        }
    }

    /// Missing profile files degrade to `None` rather than failing the profile.
    fn read_optional(&self, locator: Option<&StorageLocator>) -> Option<Vec<u8>> {
        let locator = locator?;
        match self.stores.files.read_file(locator) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(file = %locator.filename, error = %e, "profile file unreadable");
                None
            }
        }
    }
}
