use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    base62,
    error::AppResult,
    pastes::dto::{CreatedPaste, NewPaste, PasteResponse},
    state::AppState,
};

/// Header carrying the password of a protected paste.
pub const PASTE_PASSWORD_HEADER: &str = "x-paste-password";

pub fn paste_routes() -> Router<AppState> {
    Router::new()
        .route("/paste", post(create_paste))
        .route("/paste/:short_id", get(get_paste).delete(delete_paste))
}

#[instrument(skip(state, payload))]
pub async fn create_paste(
    State(state): State<AppState>,
    Json(payload): Json<NewPaste>,
) -> AppResult<(StatusCode, HeaderMap, Json<CreatedPaste>)> {
    let paste = state.pastes.create(payload).await?;
    let short_id = paste.url();

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/paste/{short_id}").parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(CreatedPaste {
            short_id,
            created_at: paste.created_at,
            expires_at: paste.expires_at,
        }),
    ))
}

#[instrument(skip(state, headers))]
pub async fn get_paste(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Json<PasteResponse>> {
    let password = headers
        .get(PASTE_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok());
    let paste = state.pastes.paste_by_short_id(&short_id, password).await?;
    Ok(Json(paste.into()))
}

#[instrument(skip(state))]
pub async fn delete_paste(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> AppResult<StatusCode> {
    // an id that cannot exist is already deleted
    if let Some(id) = base62::decode(&short_id) {
        state.pastes.delete(id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        paste_routes().with_state(AppState::fake())
    }

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn create(app: &Router, body: Value) -> String {
        let req = Request::post("/paste")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = call(app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        body["short_id"].as_str().unwrap().to_string()
    }

    fn get(short_id: &str, password: Option<&str>) -> Request<Body> {
        let mut req = Request::get(format!("/paste/{short_id}"));
        if let Some(pw) = password {
            req = req.header(PASTE_PASSWORD_HEADER, pw);
        }
        req.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn create_get_delete() {
        let app = app();
        let id = create(&app, json!({"title": "t", "body": "hello", "syntax": "rust"})).await;

        let (status, body) = call(&app, get(&id, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["body"], "hello");
        assert_eq!(body["short_id"], id.as_str());
        assert_eq!(body["protected"], false);

        let req = Request::delete(format!("/paste/{id}")).body(Body::empty()).unwrap();
        let (status, _) = call(&app, req).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call(&app, get(&id, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn protected_one_time_paste() {
        let app = app();
        let id = create(
            &app,
            json!({
                "body": "secret",
                "syntax": "text",
                "password": "pw",
                "delete_after_read": true
            }),
        )
        .await;

        let (status, _) = call(&app, get(&id, None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, get(&id, Some("nope"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&app, get(&id, Some("pw"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["body"], "secret");
        assert_eq!(body["protected"], true);

        let (status, _) = call(&app, get(&id, Some("pw"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_input() {
        let app = app();
        let req = Request::post("/paste")
            .header("content-type", "application/json")
            .body(Body::from(json!({"body": "", "syntax": "text"}).to_string()))
            .unwrap();
        let (status, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = call(&app, get("not-base62!", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
