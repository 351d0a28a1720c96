// ABOUTME: Scoped HTTP interception: one loopback listener per logical host, torn down on close
// ABOUTME: Also holds the token-header guards and the response for requests no scope claims

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::{sync::watch, task::JoinHandle};

use symphony_mock_core::fixtures::{
    KEY_MANAGER_TOKEN, KEY_MANAGER_TOKEN_HEADER, SESSION_TOKEN, SESSION_TOKEN_HEADER,
};

/// The endpoint families the mock registers, each bound to one logical host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Unauthenticated echo on the pod host
    Default,
    SessionAuth,
    KeyAuth,
    Pod,
    Agent,
}

impl Scope {
    pub const ALL: [Scope; 5] = [
        Scope::Default,
        Scope::SessionAuth,
        Scope::KeyAuth,
        Scope::Pod,
        Scope::Agent,
    ];
}

// =============================================================================
// Interceptor
// =============================================================================

/// A logical host and the loopback address standing in for it
#[derive(Debug, Clone)]
pub struct BoundHost {
    pub host: String,
    pub url: String,
    pub scopes: Vec<Scope>,
}

/// Owns the listeners for every logical host. Dropping it signals shutdown;
/// `shutdown()` also waits for the server tasks to finish.
pub struct Interceptor {
    hosts: Vec<BoundHost>,
    cancel_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Interceptor {
    /// Bind one listener per distinct host. Scopes sharing a host share a
    /// listener and `make_router` receives all of them together.
    pub async fn bind<F>(
        bindings: &[(Scope, String)],
        bind_address: &str,
        make_router: F,
    ) -> Result<Self>
    where
        F: Fn(&[Scope]) -> Router,
    {
        let mut grouped: Vec<(String, Vec<Scope>)> = Vec::new();
        for (scope, host) in bindings {
            match grouped.iter_mut().find(|(h, _)| h == host) {
                Some((_, scopes)) => scopes.push(*scope),
                None => grouped.push((host.clone(), vec![*scope])),
            }
        }

        let (cancel_tx, _) = watch::channel(false);
        let mut interceptor = Self {
            hosts: Vec::with_capacity(grouped.len()),
            cancel_tx,
            tasks: Vec::with_capacity(grouped.len()),
        };

        for (host, scopes) in grouped {
            let listener = tokio::net::TcpListener::bind((bind_address, 0))
                .await
                .with_context(|| {
                    format!("Failed to bind listener for {} on {}", host, bind_address)
                })?;
            let addr = listener
                .local_addr()
                .context("Failed to read listener address")?;
            let url = format!("http://{}", addr);
            tracing::debug!(host = %host, url = %url, scopes = ?scopes, "Intercepting host");

            let app = make_router(&scopes);
            let mut cancel_rx = interceptor.cancel_tx.subscribe();
            let task_host = host.clone();
            interceptor.tasks.push(tokio::spawn(async move {
                let shutdown = async move {
                    // Sender dropped also means shut down
                    let _ = cancel_rx.wait_for(|cancelled| *cancelled).await;
                };
                if let Err(e) = axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await
                {
                    tracing::error!(host = %task_host, error = %e, "Interceptor listener failed");
                }
            }));
            interceptor.hosts.push(BoundHost { host, url, scopes });
        }

        Ok(interceptor)
    }

    pub fn hosts(&self) -> &[BoundHost] {
        &self.hosts
    }

    /// Base URL standing in for a logical host
    pub fn url_for_host(&self, host: &str) -> Option<&str> {
        self.hosts
            .iter()
            .find(|b| b.host == host)
            .map(|b| b.url.as_str())
    }

    /// Base URL of the listener serving a scope
    pub fn url_for_scope(&self, scope: Scope) -> Option<&str> {
        self.hosts
            .iter()
            .find(|b| b.scopes.contains(&scope))
            .map(|b| b.url.as_str())
    }

    /// Stop every listener and wait for them to exit
    pub async fn shutdown(mut self) {
        let _ = self.cancel_tx.send(true);
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Interceptor task did not exit cleanly");
            }
        }
    }
}

impl Drop for Interceptor {
    fn drop(&mut self) {
        let _ = self.cancel_tx.send(true);
    }
}

// =============================================================================
// Responses
// =============================================================================

/// `{code, message}` body used for scripted errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
        }
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// A request that no registered scope claims
#[derive(Debug, Clone)]
pub struct Unmatched {
    method: Method,
    target: String,
}

impl Unmatched {
    pub fn new(method: &Method, uri: &Uri) -> Self {
        let target = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        Self {
            method: method.clone(),
            target,
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(&parts.method, &parts.uri)
    }
}

impl IntoResponse for Unmatched {
    fn into_response(self) -> Response {
        tracing::warn!(method = %self.method, target = %self.target, "No match for request");
        ErrorBody::new(
            StatusCode::NOT_FOUND,
            format!("No match for request {} {}", self.method, self.target),
        )
        .into_response_with(StatusCode::NOT_FOUND)
    }
}

/// Router fallback
pub async fn unmatched(method: Method, uri: Uri) -> Unmatched {
    Unmatched::new(&method, &uri)
}

// =============================================================================
// Token header guards
// =============================================================================

/// The two auth headers as sent. An absent header is `None`; an empty
/// one is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenHeaders {
    pub session: Option<String>,
    pub key_manager: Option<String>,
}

impl TokenHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        };
        Self {
            session: read(SESSION_TOKEN_HEADER),
            key_manager: read(KEY_MANAGER_TOKEN_HEADER),
        }
    }

    /// Neither token sent
    pub fn is_anonymous(&self) -> bool {
        self.session.is_none() && self.key_manager.is_none()
    }

    /// Session token only
    pub fn is_pod_session(&self) -> bool {
        self.session.as_deref() == Some(SESSION_TOKEN) && self.key_manager.is_none()
    }

    /// Both tokens
    pub fn is_agent_session(&self) -> bool {
        self.session.as_deref() == Some(SESSION_TOKEN)
            && self.key_manager.as_deref() == Some(KEY_MANAGER_TOKEN)
    }
}

/// Header state a scope requires
pub trait HeaderRule {
    fn admits(tokens: &TokenHeaders) -> bool;
}

pub struct Anonymous;
pub struct PodSession;
pub struct AgentSession;

impl HeaderRule for Anonymous {
    fn admits(tokens: &TokenHeaders) -> bool {
        tokens.is_anonymous()
    }
}

impl HeaderRule for PodSession {
    fn admits(tokens: &TokenHeaders) -> bool {
        tokens.is_pod_session()
    }
}

impl HeaderRule for AgentSession {
    fn admits(tokens: &TokenHeaders) -> bool {
        tokens.is_agent_session()
    }
}

/// Extractor that lets a handler run only when the token headers satisfy
/// `R`; otherwise the request is treated as unmatched.
pub struct Guard<R>(PhantomData<fn() -> R>);

impl<R, S> FromRequestParts<S> for Guard<R>
where
    R: HeaderRule,
    S: Send + Sync,
{
    type Rejection = Unmatched;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if R::admits(&TokenHeaders::from_headers(&parts.headers)) {
            Ok(Guard(PhantomData))
        } else {
            Err(Unmatched::from_parts(parts))
        }
    }
}

/// A reply that is served to the first matching request only; later
/// requests fall through as unmatched.
#[derive(Debug, Default)]
pub struct OneShot(AtomicBool);

impl OneShot {
    /// True for the first caller, false for everyone after
    pub fn claim(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }
}

// =============================================================================
// Request bodies
// =============================================================================

/// JSON body parsed regardless of `Content-Type`. Malformed bodies get a
/// 400 with an `ErrorBody`.
pub struct LenientJson<T>(pub T);

impl<T, S> FromRequest<S> for LenientJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        serde_json::from_slice(&bytes).map(LenientJson).map_err(|e| {
            ErrorBody::new(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e))
                .into_response_with(StatusCode::BAD_REQUEST)
        })
    }
}

/// Group `(key, value)` query pairs, keeping the last value for repeated keys
pub fn query_map(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    fn headers(session: Option<&str>, km: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(s) = session {
            map.insert(
                HeaderName::from_bytes(b"sessionToken").unwrap(),
                HeaderValue::from_str(s).unwrap(),
            );
        }
        if let Some(k) = km {
            map.insert(
                HeaderName::from_bytes(b"keyManagerToken").unwrap(),
                HeaderValue::from_str(k).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_header_states_are_mutually_exclusive() {
        let cases = [
            (None, None),
            (Some(SESSION_TOKEN), None),
            (Some(SESSION_TOKEN), Some(KEY_MANAGER_TOKEN)),
            (None, Some(KEY_MANAGER_TOKEN)),
            (Some("wrong"), None),
        ];
        for (session, km) in cases {
            let tokens = TokenHeaders::from_headers(&headers(session, km));
            let matched = [
                tokens.is_anonymous(),
                tokens.is_pod_session(),
                tokens.is_agent_session(),
            ]
            .iter()
            .filter(|m| **m)
            .count();
            assert!(matched <= 1, "{:?} matched {} rules", tokens, matched);
        }
    }

    #[test]
    fn test_empty_header_counts_as_present() {
        let tokens = TokenHeaders::from_headers(&headers(Some(""), None));
        assert!(!tokens.is_anonymous());
        assert!(!tokens.is_pod_session());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_bytes(b"SESSIONTOKEN").unwrap(),
            HeaderValue::from_static(SESSION_TOKEN),
        );
        assert!(TokenHeaders::from_headers(&map).is_pod_session());
    }

    #[test]
    fn test_one_shot_claims_once() {
        let once = OneShot::default();
        assert!(once.claim());
        assert!(!once.claim());
        assert!(!once.claim());
    }

    #[test]
    fn test_unmatched_keeps_query() {
        let uri: Uri = "/pod/v2/user?uid=1&local=true".parse().unwrap();
        let unmatched = Unmatched::new(&Method::GET, &uri);
        assert_eq!(unmatched.target, "/pod/v2/user?uid=1&local=true");
    }
}
