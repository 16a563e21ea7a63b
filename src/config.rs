use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasteConfig {
    /// `None` means pastes without an explicit TTL never expire.
    pub default_ttl_minutes: Option<i64>,
    pub max_id_attempts: u32,
    /// 0 disables the expired-paste sweeper.
    pub sweep_interval_secs: u64,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            default_ttl_minutes: None,
            max_id_attempts: 5,
            sweep_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres URL. Without it the in-memory store is used.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub paste: PasteConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let secret = get("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        let jwt = JwtConfig {
            secret,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "shortpaste".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "shortpaste-users".into()),
            ttl_minutes: parse_or(&get, "JWT_TTL_MINUTES", 60)?,
        };

        let defaults = PasteConfig::default();
        let paste = PasteConfig {
            default_ttl_minutes: match get("PASTE_DEFAULT_TTL_MINUTES") {
                Some(v) => Some(
                    v.parse::<i64>()
                        .with_context(|| format!("PASTE_DEFAULT_TTL_MINUTES: invalid value {v:?}"))?,
                ),
                None => None,
            },
            max_id_attempts: parse_or(&get, "PASTE_MAX_ID_ATTEMPTS", defaults.max_id_attempts)?,
            sweep_interval_secs: parse_or(
                &get,
                "PASTE_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            )?,
        };
        if paste.max_id_attempts == 0 {
            bail!("PASTE_MAX_ID_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            database_url,
            jwt,
            paste,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "APP_PORT", 8080)?,
        })
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(v) => v
            .parse::<T>()
            .with_context(|| format!("{key}: invalid value {v:?}")),
        None => Ok(default),
    }
}
