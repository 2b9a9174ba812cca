//! User storage trait.

use crate::StoreError;
use sigver_types::{User, UserId};

/// Trait for user storage operations.
///
/// Emails are unique: implementations keep an email index and must reject a
/// second user with the same (normalised) email atomically.
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with [`StoreError::Duplicate`] if the email is taken.
    fn create_user(&self, user: &User) -> Result<(), StoreError>;

    fn get_user(&self, id: &UserId) -> Result<User, StoreError>;

    /// Look a user up by normalised email.
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Overwrite an existing user. The email must not change.
    fn update_user(&self, user: &User) -> Result<(), StoreError>;

    fn user_exists(&self, id: &UserId) -> Result<bool, StoreError> {
        match self.get_user(id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError>;

    fn user_count(&self) -> Result<u64, StoreError> {
        self.list_users().map(|v| v.len() as u64)
    }
}
