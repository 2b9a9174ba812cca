//! LMDB implementation of UserStore.
//!
//! The email index and the user record are written in one transaction, so
//! two concurrent registrations with the same email cannot both succeed.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use sigver_store::user::UserStore;
use sigver_store::StoreError;
use sigver_types::{User, UserId};

use crate::LmdbError;

pub struct LmdbUserStore {
    pub(crate) env: Arc<Env>,
    pub(crate) users_db: Database<Bytes, Bytes>,
    pub(crate) users_by_email_db: Database<Bytes, Bytes>,
}

impl UserStore for LmdbUserStore {
    fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let email = User::normalize_email(&user.email);
        let bytes = bincode::serialize(user).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        if self
            .users_by_email_db
            .get(&wtxn, email.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!("email {email}")));
        }
        if self
            .users_db
            .get(&wtxn, user.id.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!("user {}", user.id)));
        }

        self.users_db
            .put(&mut wtxn, user.id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        self.users_by_email_db
            .put(&mut wtxn, email.as_bytes(), user.id.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_user(&self, id: &UserId) -> Result<User, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .users_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("user {id}")))?;
        let user: User = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(user)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = User::normalize_email(email);
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let Some(id_bytes) = self
            .users_by_email_db
            .get(&rtxn, email.as_bytes())
            .map_err(LmdbError::from)?
        else {
            return Ok(None);
        };
        let val = self
            .users_db
            .get(&rtxn, id_bytes)
            .map_err(LmdbError::from)?
            .ok_or_else(|| {
                StoreError::Corruption(format!("email index for {email} points at a missing user"))
            })?;
        let user: User = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(Some(user))
    }

    fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let bytes = bincode::serialize(user).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing: User = match self
            .users_db
            .get(&wtxn, user.id.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(val) => bincode::deserialize(val).map_err(LmdbError::from)?,
            None => return Err(StoreError::NotFound(format!("user {}", user.id))),
        };
        if User::normalize_email(&existing.email) != User::normalize_email(&user.email) {
            return Err(StoreError::InvalidInput(
                "a user's email cannot be changed".to_string(),
            ));
        }
        self.users_db
            .put(&mut wtxn, user.id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut users = Vec::new();
        for result in self.users_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, val) = result.map_err(LmdbError::from)?;
            users.push(bincode::deserialize::<User>(val).map_err(LmdbError::from)?);
        }
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.users_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
