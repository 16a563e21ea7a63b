use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::Claims,
        dto::{Login, PublicUser, Registration, UserInfo},
        jwt::JwtKeys,
        password::CredentialHasher,
        repo_types::{NewUser, User},
    },
    error::{AppError, AppResult},
    store::UserStore,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Registration, login and session validation.
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    keys: JwtKeys,
    // verified against when the username is unknown so both failure paths cost the same
    decoy_hash: String,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, hasher: CredentialHasher, keys: JwtKeys) -> AppResult<Self> {
        let decoy_hash = hasher.hash("decoy-password-never-matches")?;
        Ok(Self {
            store,
            hasher,
            keys,
            decoy_hash,
        })
    }

    #[instrument(skip(self, reg), fields(username = %reg.username))]
    pub async fn create(&self, reg: Registration) -> AppResult<PublicUser> {
        let username = reg.username.trim().to_string();
        let email = reg.email.trim().to_lowercase();

        if username.is_empty() {
            return Err(AppError::Validation("username is required".into()));
        }
        if email.is_empty() {
            return Err(AppError::Validation("email is required".into()));
        }
        if !is_valid_email(&email) {
            return Err(AppError::Validation("invalid email".into()));
        }
        if reg.password != reg.password_confirmation {
            return Err(AppError::Validation("passwords do not match".into()));
        }

        // hash before touching the store so no store lock waits on argon2
        let password_hash = self.hasher.hash_blocking(reg.password).await?;

        let user = self
            .store
            .create(NewUser {
                username,
                email,
                password_hash,
            })
            .await
            .map_err(|e| {
                if let AppError::Duplicate(ref what) = e {
                    warn!(%what, "registration rejected");
                }
                e
            })?;

        info!(user_id = %user.id, "user registered");
        Ok(user.into())
    }

    /// Verify a login and issue a session token.
    ///
    /// Unknown usernames and wrong passwords both yield `InvalidCredentials`.
    #[instrument(skip(self, login), fields(username = %login.username))]
    pub async fn authenticate(&self, login: Login) -> AppResult<UserInfo> {
        let user = self.store.find_by_username(login.username.trim()).await?;

        let (hash, user) = match user {
            Some(u) => (u.password_hash.clone(), Some(u)),
            None => (self.decoy_hash.clone(), None),
        };
        let ok = self.hasher.verify_blocking(login.password, hash).await?;

        let user = match (ok, user) {
            (true, Some(u)) => u,
            _ => {
                warn!("login rejected");
                return Err(AppError::InvalidCredentials);
            }
        };

        let token = self.keys.sign(&user.username)?;
        info!(user_id = %user.id, "user logged in");
        Ok(UserInfo {
            id: user.id,
            username: user.username,
            token,
        })
    }

    /// Check that `token` is live and was issued to `user`.
    pub fn validate(&self, user: &User, token: &str) -> AppResult<Claims> {
        let claims = self.keys.verify(token)?;
        if claims.sub != user.username {
            warn!(user_id = %user.id, "token subject mismatch");
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    /// [`validate`](Self::validate) for callers that only know the username.
    #[instrument(skip(self, token))]
    pub async fn validate_username(&self, username: &str, token: &str) -> AppResult<Claims> {
        let user = self
            .store
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidToken)?;
        self.validate(&user, token)
    }

    /// Resolve a bearer token to the user it belongs to.
    pub async fn current_user(&self, token: &str) -> AppResult<PublicUser> {
        let claims = self.keys.verify(token)?;
        let user = self
            .store
            .find_by_username(&claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;
        Ok(user.into())
    }
}
