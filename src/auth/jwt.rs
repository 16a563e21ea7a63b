use std::time::Duration;

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{
    auth::claims::Claims,
    config::JwtConfig,
    error::{AppError, AppResult},
};

/// Issues and verifies HS256 session tokens.
///
/// Tokens are stateless: a token is valid as long as its signature matches,
/// its issuer and audience are ours and `now <= exp`.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64) * 60),
        }
    }

    /// Sign a token for `subject` with the configured TTL.
    pub fn sign(&self, subject: &str) -> AppResult<String> {
        self.issue(subject, self.ttl)
    }

    pub fn issue(&self, subject: &str, ttl: Duration) -> AppResult<String> {
        self.issue_at(subject, ttl, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, subject: &str, ttl: Duration, now: OffsetDateTime) -> AppResult<String> {
        let iat = now.unix_timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(ttl.as_secs() as i64),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::storage("sign token", e))?;
        debug!(subject = %subject, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Verify signature, structure, issuer and audience, then expiry against `now`.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> AppResult<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        // expiry is checked below against the caller's clock, without leeway
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => warn!("jwt signature mismatch"),
                kind => debug!(?kind, "jwt rejected"),
            }
            AppError::InvalidToken
        })?;

        if now.unix_timestamp() > data.claims.exp {
            debug!(subject = %data.claims.sub, "jwt expired");
            return Err(AppError::Expired);
        }
        debug!(subject = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
        })
    }

    #[test]
    fn sign_and_verify() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let token = keys.sign("alice").expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 5 * 60);
    }

    #[test]
    fn expires_once_clock_passes_ttl() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let now = OffsetDateTime::now_utc();
        let token = keys.issue_at("alice", Duration::from_secs(60), now).unwrap();

        assert!(keys.verify_at(&token, now).is_ok());
        assert!(keys.verify_at(&token, now + time::Duration::seconds(60)).is_ok());
        let err = keys
            .verify_at(&token, now + time::Duration::seconds(61))
            .unwrap_err();
        assert!(matches!(err, AppError::Expired));
    }

    #[test]
    fn already_expired_token_fails_on_wall_clock() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - time::Duration::minutes(10);
        let token = keys.issue_at("alice", Duration::from_secs(60), issued).unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::Expired)));
    }

    #[test]
    fn rejects_other_secret() {
        let a = make_keys("secret-alpha", "iss", "aud");
        let b = make_keys("secret-bravo", "iss", "aud");
        let token = a.sign("alice").unwrap();
        assert!(matches!(b.verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn rejects_wrong_issuer_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.sign("alice").unwrap();
        assert!(matches!(bad.verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn rejects_tampered_and_malformed_tokens() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign("alice").unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = keys.sign("mallory").unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap();
        parts[1] = forged_payload;
        let tampered = parts.join(".");
        assert!(matches!(keys.verify(&tampered), Err(AppError::InvalidToken)));

        assert!(matches!(keys.verify("not.a.token"), Err(AppError::InvalidToken)));
        assert!(matches!(keys.verify(""), Err(AppError::InvalidToken)));
    }
}
