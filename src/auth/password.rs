use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{AppError, AppResult};

/// Argon2id hashing for account and paste passwords.
///
/// Hashes are PHC strings, so the salt and cost parameters travel with the
/// hash and verification needs nothing else. The final digest comparison is
/// constant-time.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl CredentialHasher {
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Cheapest parameters argon2 accepts. Only for tests.
    #[cfg(test)]
    pub fn fast() -> Self {
        let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, 1, None)
            .expect("minimum argon2 params are valid");
        Self::new(params)
    }

    pub fn hash(&self, plain: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                AppError::storage("hash password", e)
            })?
            .to_string();
        Ok(hash)
    }

    /// Returns `Ok(false)` on mismatch and on a stored hash that does not parse;
    /// a corrupt hash must not unlock anything.
    pub fn verify(&self, plain: &str, hash: &str) -> AppResult<bool> {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "argon2 parse hash error");
                return Ok(false);
            }
        };
        match self.argon2.verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(AppError::storage("verify password", e))
            }
        }
    }

    /// [`hash`](Self::hash) on the blocking pool.
    pub async fn hash_blocking(&self, plain: String) -> AppResult<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain)).await?
    }

    /// [`verify`](Self::verify) on the blocking pool.
    pub async fn verify_blocking(&self, plain: String, hash: String) -> AppResult<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hasher = CredentialHasher::fast();
        let password = "Secur3P@ssw0rd!";
        let hash = hasher.hash(password).expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hasher = CredentialHasher::fast();
        let hash = hasher.hash("correct-horse-battery-staple").unwrap();
        assert!(!hasher.verify("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn same_password_gets_fresh_salt() {
        let hasher = CredentialHasher::fast();
        let a = hasher.hash("pw123").unwrap();
        let b = hasher.hash("pw123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let hasher = CredentialHasher::fast();
        assert!(!hasher.verify("anything", "not-a-valid-hash").unwrap());
    }

    #[test]
    fn verify_uses_params_embedded_in_hash() {
        let hash = CredentialHasher::fast().hash("pw").unwrap();
        assert!(CredentialHasher::default().verify("pw", &hash).unwrap());
    }

    #[tokio::test]
    async fn blocking_variants() {
        let hasher = CredentialHasher::fast();
        let hash = hasher.hash_blocking("pw".into()).await.unwrap();
        assert!(hasher.verify_blocking("pw".into(), hash.clone()).await.unwrap());
        assert!(!hasher.verify_blocking("nope".into(), hash).await.unwrap());
    }
}
