use std::sync::Arc;

use time::Duration;
use tracing::info;

use crate::{
    auth::{jwt::JwtKeys, password::CredentialHasher, repo::PgUserStore, services::UserService},
    config::AppConfig,
    db,
    pastes::{repo::PgPasteStore, services::PasteService},
    store::{MemoryStore, PasteStore, UserStore},
};

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<UserService>,
    pub pastes: Arc<PasteService>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let (user_store, paste_store): (Arc<dyn UserStore>, Arc<dyn PasteStore>) =
            match &config.database_url {
                Some(url) => {
                    let pool = db::connect(url).await?;
                    info!("using postgres store");
                    (
                        Arc::new(PgUserStore::new(pool.clone())) as Arc<dyn UserStore>,
                        Arc::new(PgPasteStore::new(pool)) as Arc<dyn PasteStore>,
                    )
                }
                None => {
                    info!("DATABASE_URL not set, using in-memory store");
                    let mem = Arc::new(MemoryStore::new());
                    (
                        mem.clone() as Arc<dyn UserStore>,
                        mem as Arc<dyn PasteStore>,
                    )
                }
            };
        Self::from_parts(config, user_store, paste_store, CredentialHasher::default())
    }

    pub fn from_parts(
        config: AppConfig,
        user_store: Arc<dyn UserStore>,
        paste_store: Arc<dyn PasteStore>,
        hasher: CredentialHasher,
    ) -> anyhow::Result<Self> {
        let keys = JwtKeys::new(&config.jwt);
        let users = UserService::new(user_store, hasher.clone(), keys)?;
        let pastes = PasteService::new(
            paste_store,
            hasher,
            config.paste.default_ttl_minutes.map(Duration::minutes),
            config.paste.max_id_attempts,
        );
        Ok(Self {
            config: Arc::new(config),
            users: Arc::new(users),
            pastes: Arc::new(pastes),
        })
    }

    /// In-memory state with cheap hashing, for tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        let config = AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
            },
            paste: crate::config::PasteConfig::default(),
            host: "127.0.0.1".into(),
            port: 0,
        };
        let mem = Arc::new(MemoryStore::new());
        Self::from_parts(config, mem.clone(), mem, CredentialHasher::fast())
            .expect("fake state builds")
    }
}
