use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        claims::Claims,
        dto::{Login, PublicUser, Registration, UserInfo, ValidateRequest},
        extractors::AuthUser,
    },
    error::AppResult,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
        .route("/user/validate", post(validate))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/user/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Registration>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let user = state.users.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Login>,
) -> AppResult<Json<UserInfo>> {
    Ok(Json(state.users.authenticate(payload).await?))
}

#[instrument(skip(state, payload))]
pub async fn validate(
    State(state): State<AppState>,
    Json(payload): Json<ValidateRequest>,
) -> AppResult<Json<Claims>> {
    let claims = state
        .users
        .validate_username(&payload.username, &payload.token)
        .await?;
    Ok(Json(claims))
}

pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user)
}
