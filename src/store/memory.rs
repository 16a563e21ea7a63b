use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::{PasteStore, UserStore};
use crate::{
    auth::repo_types::{NewUser, User},
    error::{AppError, AppResult},
    pastes::repo_types::Paste,
};

#[derive(Default)]
struct UserTable {
    by_id: HashMap<Uuid, User>,
    by_username: HashMap<String, Uuid>,
    by_email: HashMap<String, Uuid>,
}

/// In-process store with the same uniqueness rules as the Postgres schema.
///
/// Each table sits behind its own lock. No lock is held across an `.await`,
/// and callers hash passwords before reaching the store.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<UserTable>,
    pastes: RwLock<HashMap<u64, Paste>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut table = self.users.lock();
        if table.by_username.contains_key(&user.username) {
            return Err(AppError::Duplicate("username already exists".into()));
        }
        if table.by_email.contains_key(&user.email) {
            return Err(AppError::Duplicate("email already exists".into()));
        }

        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        table.by_username.insert(record.username.clone(), record.id);
        table.by_email.insert(record.email.clone(), record.id);
        table.by_id.insert(record.id, record.clone());
        debug!(user_id = %record.id, "user inserted (memory)");
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().by_id.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let table = self.users.lock();
        Ok(table
            .by_username
            .get(username)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let table = self.users.lock();
        Ok(table
            .by_email
            .get(email)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }
}

#[async_trait]
impl PasteStore for MemoryStore {
    async fn create(&self, paste: &Paste) -> AppResult<()> {
        let mut pastes = self.pastes.write();
        if pastes.contains_key(&paste.id) {
            return Err(AppError::Duplicate("paste id already exists".into()));
        }
        pastes.insert(paste.id, paste.clone());
        Ok(())
    }

    async fn find(&self, id: u64) -> AppResult<Option<Paste>> {
        Ok(self.pastes.read().get(&id).cloned())
    }

    async fn take(&self, id: u64) -> AppResult<Option<Paste>> {
        Ok(self.pastes.write().remove(&id))
    }

    async fn delete(&self, id: u64) -> AppResult<()> {
        self.pastes.write().remove(&id);
        Ok(())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> AppResult<u64> {
        let mut pastes = self.pastes.write();
        let before = pastes.len();
        pastes.retain(|_, p| !p.is_expired_at(now));
        Ok((before - pastes.len()) as u64)
    }
}
