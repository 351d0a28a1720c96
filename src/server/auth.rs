// ABOUTME: Session and key-manager authentication endpoints
// ABOUTME: Each accepts any credentials from an unauthenticated caller once and hands back a fixed token

use axum::{
    extract::State,
    http::{Method, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use symphony_mock_core::fixtures::{
    KEY_MANAGER_TOKEN, KEY_MANAGER_TOKEN_HEADER, SESSION_TOKEN, SESSION_TOKEN_HEADER,
};

use super::ListenerState;
use crate::interceptor::{Anonymous, Guard, OneShot, Unmatched};

pub const SESSION_AUTH_PATH: &str = "/sessionauth/v1/authenticate";
pub const KEY_AUTH_PATH: &str = "/keyauth/v1/authenticate";

/// `{name, token}` as returned by both authenticate calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub name: String,
    pub token: String,
}

pub fn session_auth_routes() -> Router<Arc<ListenerState>> {
    Router::new().route(SESSION_AUTH_PATH, post(session_authenticate))
}

pub fn key_auth_routes() -> Router<Arc<ListenerState>> {
    Router::new().route(KEY_AUTH_PATH, post(key_manager_authenticate))
}

fn issue(once: &OneShot, method: &Method, uri: &Uri, name: &str, token: &str) -> Response {
    if !once.claim() {
        return Unmatched::new(method, uri).into_response();
    }
    tracing::debug!(name, "Issuing token");
    Json(AuthToken {
        name: name.to_string(),
        token: token.to_string(),
    })
    .into_response()
}

async fn session_authenticate(
    _: Guard<Anonymous>,
    State(state): State<Arc<ListenerState>>,
    method: Method,
    uri: Uri,
) -> Response {
    issue(&state.session_auth, &method, &uri, SESSION_TOKEN_HEADER, SESSION_TOKEN)
}

async fn key_manager_authenticate(
    _: Guard<Anonymous>,
    State(state): State<Arc<ListenerState>>,
    method: Method,
    uri: Uri,
) -> Response {
    issue(
        &state.key_auth,
        &method,
        &uri,
        KEY_MANAGER_TOKEN_HEADER,
        KEY_MANAGER_TOKEN,
    )
}
