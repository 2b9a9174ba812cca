//! Nullable store: thread-safe in-memory record storage for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use sigver_store::history::HistoryStore;
use sigver_store::session::SessionStore;
use sigver_store::signature::SignatureStore;
use sigver_store::user::UserStore;
use sigver_store::StoreError;
use sigver_types::{SessionId, SignatureId, SignatureRecord, User, UserId, VerificationRecord};

/// An in-memory user + signature + history + session store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    users: Mutex<HashMap<UserId, User>>,
    emails: Mutex<HashMap<String, UserId>>,
    signatures: Mutex<HashMap<SignatureId, SignatureRecord>>,
    history: Mutex<HashMap<UserId, Vec<VerificationRecord>>>,
    revoked: Mutex<HashMap<SessionId, DateTime<Utc>>>,
    fail_history_append: AtomicBool,
    fail_signature_put: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            emails: Mutex::new(HashMap::new()),
            signatures: Mutex::new(HashMap::new()),
            history: Mutex::new(HashMap::new()),
            revoked: Mutex::new(HashMap::new()),
            fail_history_append: AtomicBool::new(false),
            fail_signature_put: AtomicBool::new(false),
        }
    }

    /// Make `append_verification` fail with a backend error.
    pub fn fail_history_append(&self, fail: bool) {
        self.fail_history_append.store(fail, Ordering::SeqCst);
    }

    /// Make `put_signature` fail with a backend error.
    pub fn fail_signature_put(&self, fail: bool) {
        self.fail_signature_put.store(fail, Ordering::SeqCst);
    }

    /// Number of signature records of any kind.
    pub fn signature_count(&self) -> usize {
        self.signatures.lock().unwrap().len()
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for NullStore {
    fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let email = User::normalize_email(&user.email);
        let mut users = self.users.lock().unwrap();
        let mut emails = self.emails.lock().unwrap();
        if emails.contains_key(&email) {
            return Err(StoreError::Duplicate(format!("email {email}")));
        }
        if users.contains_key(&user.id) {
            return Err(StoreError::Duplicate(format!("user {}", user.id)));
        }
        emails.insert(email, user.id);
        users.insert(user.id, user.clone());
        Ok(())
    }

    fn get_user(&self, id: &UserId) -> Result<User, StoreError> {
        self.users
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = User::normalize_email(email);
        let Some(id) = self.emails.lock().unwrap().get(&email).copied() else {
            return Ok(None);
        };
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        let existing = users
            .get_mut(&user.id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user.id)))?;
        if User::normalize_email(&existing.email) != User::normalize_email(&user.email) {
            return Err(StoreError::InvalidInput("email cannot change".into()));
        }
        *existing = user.clone();
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }
}

impl SignatureStore for NullStore {
    fn put_signature(&self, record: &SignatureRecord) -> Result<(), StoreError> {
        if self.fail_signature_put.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected signature write failure".into()));
        }
        if !self.users.lock().unwrap().contains_key(&record.owner) {
            return Err(StoreError::NotFound(format!("owner {}", record.owner)));
        }
        let mut signatures = self.signatures.lock().unwrap();
        if signatures.contains_key(&record.id) {
            return Err(StoreError::Duplicate(format!("signature {}", record.id)));
        }
        signatures.insert(record.id, record.clone());
        Ok(())
    }

    fn get_signature(&self, id: &SignatureId) -> Result<SignatureRecord, StoreError> {
        self.signatures
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("signature {id}")))
    }

    fn signatures_for_owner(
        &self,
        owner: &UserId,
        is_reference: bool,
    ) -> Result<Vec<SignatureRecord>, StoreError> {
        let mut found: Vec<SignatureRecord> = self
            .signatures
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.owner == *owner && s.is_reference == is_reference)
            .cloned()
            .collect();
        found.sort_by(SignatureRecord::newest_first);
        Ok(found)
    }

    fn delete_signature(&self, id: &SignatureId) -> Result<SignatureRecord, StoreError> {
        self.signatures
            .lock()
            .unwrap()
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("signature {id}")))
    }
}

impl HistoryStore for NullStore {
    fn append_verification(
        &self,
        user: &UserId,
        record: &VerificationRecord,
    ) -> Result<u64, StoreError> {
        if self.fail_history_append.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected history failure".into()));
        }
        if !self.users.lock().unwrap().contains_key(user) {
            return Err(StoreError::NotFound(format!("user {user}")));
        }
        let mut history = self.history.lock().unwrap();
        let log = history.entry(*user).or_default();
        log.push(record.clone());
        Ok(log.len() as u64)
    }

    fn history_for_user(&self, user: &UserId) -> Result<Vec<VerificationRecord>, StoreError> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .get(user)
            .cloned()
            .unwrap_or_default())
    }
}

impl SessionStore for NullStore {
    fn revoke_session(&self, id: &SessionId, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.revoked.lock().unwrap().insert(*id, expires_at);
        Ok(())
    }

    fn is_revoked(&self, id: &SessionId) -> Result<bool, StoreError> {
        Ok(self.revoked.lock().unwrap().contains_key(id))
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut revoked = self.revoked.lock().unwrap();
        let before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at > now);
        Ok((before - revoked.len()) as u64)
    }
}
