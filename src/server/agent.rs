// ABOUTME: Agent endpoints: echo, message creation, and datafeed create/read
// ABOUTME: Message creation feeds the queue that datafeed reads drain; both datafeed calls honor injected failures

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use symphony_mock_core::fixtures::{DATAFEED_ID, STREAM_ID};
use symphony_mock_core::message::CreateMessagePayload;
use symphony_mock_core::{CreateOutcome, ReadOutcome, SymphonyMessage};

use super::ListenerState;
use crate::interceptor::{
    AgentSession, ErrorBody, Guard, LenientJson, Scope, TokenHeaders, Unmatched,
};

pub const ECHO_PATH: &str = "/agent/v1/util/echo";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatafeedId {
    pub id: String,
}

pub fn routes() -> Router<Arc<ListenerState>> {
    Router::new()
        .route(
            &format!("/agent/v4/stream/{}/message/create", STREAM_ID),
            post(create_message),
        )
        .route("/agent/v4/datafeed/create", post(create_datafeed))
        .route(
            &format!("/agent/v4/datafeed/{}/read", DATAFEED_ID),
            get(read_datafeed),
        )
}

/// Shared by the pod host's unauthenticated scope and the agent scope;
/// the token headers decide which one answers.
pub async fn echo(
    State(state): State<Arc<ListenerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let tokens = TokenHeaders::from_headers(&headers);
    if state.serves(Scope::Agent) && tokens.is_agent_session() {
        return (
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response();
    }
    if state.serves(Scope::Default) && tokens.is_anonymous() && state.invalid_session.claim() {
        return ErrorBody::new(StatusCode::UNAUTHORIZED, "Invalid session")
            .into_response_with(StatusCode::UNAUTHORIZED);
    }
    Unmatched::new(&method, &uri).into_response()
}

async fn create_message(
    _: Guard<AgentSession>,
    State(state): State<Arc<ListenerState>>,
    LenientJson(payload): LenientJson<CreateMessagePayload>,
) -> Json<SymphonyMessage> {
    let message = SymphonyMessage::sent_by_bot(&payload.message);
    state.datafeed.receive(message.clone());
    Json(message)
}

async fn create_datafeed(
    _: Guard<AgentSession>,
    State(state): State<Arc<ListenerState>>,
) -> Response {
    match state.datafeed.create() {
        CreateOutcome::Failed => StatusCode::BAD_REQUEST.into_response(),
        CreateOutcome::Created(id) => Json(DatafeedId { id }).into_response(),
    }
}

async fn read_datafeed(
    _: Guard<AgentSession>,
    State(state): State<Arc<ListenerState>>,
) -> Response {
    match state.datafeed.read() {
        ReadOutcome::Failed => StatusCode::BAD_REQUEST.into_response(),
        ReadOutcome::Empty => StatusCode::NO_CONTENT.into_response(),
        ReadOutcome::Messages(events) => Json(events).into_response(),
    }
}
