use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{auth::dto::PublicUser, error::AppError, state::AppState};

/// Resolves `Authorization: Bearer <token>` to the signed-in user.
pub struct AuthUser(pub PublicUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
            .ok_or(AppError::InvalidToken)?;

        let user = state.users.current_user(token.trim()).await?;
        Ok(AuthUser(user))
    }
}
