use std::sync::Arc;

use rand::{rngs::OsRng, RngCore};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::password::CredentialHasher,
    base62,
    error::{AppError, AppResult},
    pastes::{dto::NewPaste, repo_types::Paste},
    store::PasteStore,
};

/// Paste lifecycle: creation with random ids, reads that honour expiry,
/// passwords and one-time reads, and deletion.
pub struct PasteService {
    store: Arc<dyn PasteStore>,
    hasher: CredentialHasher,
    default_ttl: Option<Duration>,
    max_id_attempts: u32,
}

impl PasteService {
    pub fn new(
        store: Arc<dyn PasteStore>,
        hasher: CredentialHasher,
        default_ttl: Option<Duration>,
        max_id_attempts: u32,
    ) -> Self {
        Self {
            store,
            hasher,
            default_ttl,
            max_id_attempts: max_id_attempts.max(1),
        }
    }

    #[instrument(skip(self, new), fields(syntax = %new.syntax, delete_after_read = new.delete_after_read))]
    pub async fn create(&self, new: NewPaste) -> AppResult<Paste> {
        if new.body.is_empty() {
            return Err(AppError::Validation("body is required".into()));
        }
        if new.syntax.trim().is_empty() {
            return Err(AppError::Validation("syntax is required".into()));
        }

        let password_hash = match new.password.filter(|p| !p.is_empty()) {
            Some(p) => Some(self.hasher.hash_blocking(p).await?),
            None => None,
        };

        let created_at = OffsetDateTime::now_utc();
        let ttl = new.expires_in_secs.map(Duration::seconds).or(self.default_ttl);
        let expires_at = ttl.map(|ttl| created_at.saturating_add(ttl));

        let mut paste = Paste {
            id: 0,
            title: new.title.filter(|t| !t.trim().is_empty()),
            body: new.body,
            syntax: new.syntax,
            password_hash,
            delete_after_read: new.delete_after_read,
            created_at,
            expires_at,
        };

        for attempt in 1..=self.max_id_attempts {
            paste.id = OsRng.next_u64();
            match self.store.create(&paste).await {
                Ok(()) => {
                    info!(short_id = %paste.url(), "paste created");
                    return Ok(paste);
                }
                Err(AppError::Duplicate(_)) => {
                    warn!(attempt, "paste id collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::Storage(format!(
            "no free paste id after {} attempts",
            self.max_id_attempts
        )))
    }

    /// Fetch a paste for display.
    ///
    /// Expired pastes are deleted and reported as `NotFound`. A protected paste
    /// needs the right `password`, otherwise `Unauthorized` and the paste is left
    /// in place. A delete-after-read paste is consumed atomically on success.
    #[instrument(skip(self, password))]
    pub async fn paste(&self, id: u64, password: Option<&str>) -> AppResult<Paste> {
        let paste = self.store.find(id).await?.ok_or(AppError::NotFound)?;

        if paste.is_expired_at(OffsetDateTime::now_utc()) {
            debug!("paste expired, deleting");
            self.store.delete(id).await?;
            return Err(AppError::NotFound);
        }

        if let Some(hash) = &paste.password_hash {
            let Some(candidate) = password else {
                return Err(AppError::Unauthorized);
            };
            let ok = self
                .hasher
                .verify_blocking(candidate.to_string(), hash.clone())
                .await?;
            if !ok {
                warn!("wrong paste password");
                return Err(AppError::Unauthorized);
            }
        }

        if paste.delete_after_read {
            // another reader may have consumed it since the lookup above
            let taken = self.store.take(id).await?.ok_or(AppError::NotFound)?;
            info!("one-time paste consumed");
            return Ok(taken);
        }
        Ok(paste)
    }

    /// [`paste`](Self::paste) by short identifier.
    pub async fn paste_by_short_id(&self, short_id: &str, password: Option<&str>) -> AppResult<Paste> {
        let id = base62::decode(short_id).ok_or(AppError::NotFound)?;
        self.paste(id, password).await
    }

    /// Idempotent.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> AppResult<()> {
        self.store.delete(id).await
    }

    /// Remove every expired paste. Returns the number removed.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let removed = self.store.delete_expired(OffsetDateTime::now_utc()).await?;
        if removed > 0 {
            info!(removed, "expired pastes purged");
        }
        Ok(removed)
    }
}
