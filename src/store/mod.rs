//! Persistence capabilities the services depend on.
//!
//! Two backends implement them: [`MemoryStore`] and the Postgres stores in
//! `auth::repo` / `pastes::repo`. Both enforce uniqueness inside the insert
//! itself, never as a separate check.

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User},
    error::AppResult,
    pastes::repo_types::Paste,
};

mod memory;

pub use memory::MemoryStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `Duplicate` if the username or the email is taken.
    async fn create(&self, user: NewUser) -> AppResult<User>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
}

#[async_trait]
pub trait PasteStore: Send + Sync {
    /// Insert a paste. Fails with `Duplicate` if the id is taken.
    async fn create(&self, paste: &Paste) -> AppResult<()>;
    async fn find(&self, id: u64) -> AppResult<Option<Paste>>;
    /// Read and delete in one step. At most one caller gets `Some` per paste.
    async fn take(&self, id: u64) -> AppResult<Option<Paste>>;
    /// Idempotent.
    async fn delete(&self, id: u64) -> AppResult<()>;
    /// Remove every paste with `expires_at <= now`, returning how many went.
    async fn delete_expired(&self, now: OffsetDateTime) -> AppResult<u64>;
}
