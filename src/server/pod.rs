// ABOUTME: Pod endpoints: session info, user lookup, IM creation, and room management
// ABOUTME: Every handler is a pure function of its request; none of them change fixture state

use axum::{
    extract::{Path, Query},
    http::{Method, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use symphony_mock_core::fixtures::{self, UserQuery, BOT_USER_ID, REAL_USER_ID, STREAM_ID};
use symphony_mock_core::room::{self, MembershipAction, UpdateRoomPayload};

use super::ListenerState;
use crate::interceptor::{query_map, Guard, LenientJson, PodSession, Unmatched};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamId {
    pub id: String,
}

pub fn routes() -> Router<Arc<ListenerState>> {
    Router::new()
        .route("/pod/v1/sessioninfo", get(session_info))
        .route("/pod/v2/user", get(user_lookup))
        .route("/pod/v1/im/create", post(create_im))
        .route("/pod/v2/room/create", post(create_room))
        .route(&format!("/pod/v2/room/{}/info", STREAM_ID), get(room_info))
        .route(&format!("/pod/v1/room/{}/setActive", STREAM_ID), post(set_active))
        .route(&format!("/pod/v2/room/{}/update", STREAM_ID), post(update_room))
        .route(
            &format!("/pod/v2/room/{}/membership/list", STREAM_ID),
            get(membership_list),
        )
        .route(
            &format!("/pod/v1/room/{}/membership/{{action}}", STREAM_ID),
            post(change_membership),
        )
}

async fn session_info(_: Guard<PodSession>) -> Json<SessionInfo> {
    Json(SessionInfo {
        user_id: BOT_USER_ID,
    })
}

/// Matches only a single selector plus `local=true`
pub fn parse_user_query(pairs: Vec<(String, String)>) -> Option<UserQuery> {
    if pairs.len() != 2 {
        return None;
    }
    let query = query_map(pairs);
    if query.get("local").map(String::as_str) != Some("true") {
        return None;
    }
    query
        .iter()
        .filter(|(key, _)| key.as_str() != "local")
        .find_map(|(key, value)| UserQuery::from_pair(key, value))
}

async fn user_lookup(
    _: Guard<PodSession>,
    method: Method,
    uri: Uri,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    match parse_user_query(pairs)
        .as_ref()
        .and_then(fixtures::lookup_user)
    {
        Some(user) => Json(user).into_response(),
        None => Unmatched::new(&method, &uri).into_response(),
    }
}

/// Only an IM with the real user is scripted
async fn create_im(
    _: Guard<PodSession>,
    method: Method,
    uri: Uri,
    LenientJson(body): LenientJson<Value>,
) -> Response {
    if body != json!([REAL_USER_ID]) {
        return Unmatched::new(&method, &uri).into_response();
    }
    Json(StreamId {
        id: STREAM_ID.to_string(),
    })
    .into_response()
}

async fn create_room(
    _: Guard<PodSession>,
    LenientJson(attributes): LenientJson<Value>,
) -> Json<room::RoomInfo<Value>> {
    Json(room::created_room(attributes))
}

async fn room_info(_: Guard<PodSession>) -> Json<room::RoomInfo> {
    Json(room::room_info())
}

async fn set_active(
    _: Guard<PodSession>,
    method: Method,
    uri: Uri,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let query = query_map(pairs);
    let Some(flag) = query.get("active") else {
        return Unmatched::new(&method, &uri).into_response();
    };
    Json(room::set_active(room::parse_active_flag(Some(flag.as_str())))).into_response()
}

async fn update_room(
    _: Guard<PodSession>,
    LenientJson(update): LenientJson<UpdateRoomPayload>,
) -> Json<room::RoomInfo> {
    Json(room::updated_room(update))
}

async fn membership_list(_: Guard<PodSession>) -> Json<Vec<room::Member>> {
    Json(room::membership_list())
}

async fn change_membership(
    _: Guard<PodSession>,
    method: Method,
    uri: Uri,
    Path(action): Path<String>,
) -> Response {
    match MembershipAction::from_path_segment(&action) {
        Some(action) => Json(room::membership_change(action)).into_response(),
        None => Unmatched::new(&method, &uri).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphony_mock_core::fixtures::REAL_USER_EMAIL;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_user_query_requires_local() {
        assert_eq!(
            parse_user_query(pairs(&[("email", REAL_USER_EMAIL), ("local", "true")])),
            Some(UserQuery::Email(REAL_USER_EMAIL.to_string()))
        );
        assert_eq!(parse_user_query(pairs(&[("email", REAL_USER_EMAIL)])), None);
        assert_eq!(
            parse_user_query(pairs(&[("email", REAL_USER_EMAIL), ("local", "false")])),
            None
        );
    }

    #[test]
    fn test_parse_user_query_rejects_extra_params() {
        assert_eq!(
            parse_user_query(pairs(&[
                ("uid", "7215545078229"),
                ("local", "true"),
                ("extra", "1")
            ])),
            None
        );
    }
}
