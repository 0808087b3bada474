//! HTTP routes served next to the Telegram webhook.
//!
//! - `GET /`               liveness text
//! - `GET /health`         health check
//! - `GET /auth`           redirect to the Google consent screen
//! - `GET /oauth2callback` exchange the consent code, return `token.json`

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::BotError;
use crate::google::Credential;
use crate::telegram::BotState;

pub fn router(state: Arc<BotState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/auth", get(auth_handler))
        .route("/oauth2callback", get(oauth_callback_handler))
        .with_state(state)
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({ "status": "Bot is running" }))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn auth_handler(State(state): State<Arc<BotState>>) -> Response {
    match state.oauth.authorization_url() {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            error!("Cannot build consent URL: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "auth_failed", "details": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

async fn oauth_callback_handler(
    State(state): State<Arc<BotState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let result = match (params.code, params.error) {
        (_, Some(denied)) => Err(BotError::OAuthNotCompleted(format!("consent denied: {}", denied))),
        (Some(code), None) => state.oauth.exchange_code(&code).await,
        (None, None) => Err(BotError::OAuthNotCompleted("callback without code".into())),
    };

    match result {
        Ok(user) => {
            let token_json = json!(user);
            state.auth.install(Credential::AuthorizedUser(user)).await;
            info!("OAuth callback succeeded; store token_json as TOKEN_JSON or token.json");
            Json(json!({ "token_json": token_json })).into_response()
        }
        Err(e) => {
            error!("OAuth callback failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "oauth2callback_failed", "details": e.to_string() })),
            )
                .into_response()
        }
    }
}
