// ABOUTME: The Symphony mock server: wires the pod, agent, and auth scopes onto intercepted hosts
// ABOUTME: Exposes fault injection, the message-received event, and close() for per-test teardown

pub mod agent;
pub mod auth;
pub mod pod;

use anyhow::{Context, Result};
use axum::{routing::post, Router};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use symphony_mock_core::fixtures::{DATAFEED_ID, STREAM_ID};
use symphony_mock_core::{DatafeedState, FixtureEvent};

use crate::config::{MockConfig, ResolvedHosts};
use crate::interceptor::{unmatched, BoundHost, Interceptor, OneShot, Scope};

/// State shared by every handler on one listener
pub struct ListenerState {
    scopes: Vec<Scope>,
    datafeed: Arc<DatafeedState>,
    /// Pre-auth replies answer once per server, then stop matching
    session_auth: OneShot,
    key_auth: OneShot,
    invalid_session: OneShot,
}

impl ListenerState {
    /// Whether this listener's host carries the given scope
    pub fn serves(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }
}

/// Assemble the router for one host from the scopes registered on it
fn host_router(scopes: &[Scope], datafeed: Arc<DatafeedState>) -> Router {
    let mut router = Router::new();
    for scope in scopes {
        router = match scope {
            Scope::SessionAuth => router.merge(auth::session_auth_routes()),
            Scope::KeyAuth => router.merge(auth::key_auth_routes()),
            Scope::Pod => router.merge(pod::routes()),
            Scope::Agent => router.merge(agent::routes()),
            Scope::Default => router,
        };
    }
    // The echo path belongs to two scopes that may share a host
    if scopes.contains(&Scope::Default) || scopes.contains(&Scope::Agent) {
        router = router.route(agent::ECHO_PATH, post(agent::echo));
    }

    let state = Arc::new(ListenerState {
        scopes: scopes.to_vec(),
        datafeed,
        session_auth: OneShot::default(),
        key_auth: OneShot::default(),
        invalid_session: OneShot::default(),
    });
    router
        .fallback(unmatched)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn scope_bindings(hosts: &ResolvedHosts) -> Vec<(Scope, String)> {
    Scope::ALL
        .into_iter()
        .map(|scope| {
            let host = match scope {
                Scope::Default | Scope::Pod => &hosts.host,
                Scope::SessionAuth => &hosts.session_auth_host,
                Scope::KeyAuth => &hosts.km_host,
                Scope::Agent => &hosts.agent_host,
            };
            (scope, host.clone())
        })
        .collect()
}

/// Scripted stand-in for a Symphony deployment.
///
/// Each logical host from the config is served on its own loopback port;
/// point the client under test at [`MockServer::pod_url`],
/// [`MockServer::agent_url`], and friends. Call [`MockServer::close`] at the
/// end of the test. Dropping the server also stops the listeners, without
/// waiting for them.
pub struct MockServer {
    hosts: ResolvedHosts,
    datafeed: Arc<DatafeedState>,
    interceptor: Interceptor,
    pod_url: String,
    agent_url: String,
    key_manager_url: String,
    session_auth_url: String,
}

impl MockServer {
    pub async fn start(config: MockConfig) -> Result<Self> {
        config.validate()?;
        let hosts = config.resolved_hosts();
        tracing::info!(
            host = %hosts.host,
            km_host = %hosts.km_host,
            agent_host = %hosts.agent_host,
            session_auth_host = %hosts.session_auth_host,
            "Setting up mocks"
        );

        let datafeed = Arc::new(DatafeedState::new(config.start_with_hello_world_message));
        let router_datafeed = Arc::clone(&datafeed);
        let interceptor = Interceptor::bind(
            &scope_bindings(&hosts),
            &config.bind_address,
            move |scopes| host_router(scopes, Arc::clone(&router_datafeed)),
        )
        .await
        .context("Failed to start mock listeners")?;

        let url = |scope: Scope| {
            interceptor
                .url_for_scope(scope)
                .map(str::to_string)
                .with_context(|| format!("No listener bound for {:?}", scope))
        };
        let pod_url = url(Scope::Pod)?;
        let agent_url = url(Scope::Agent)?;
        let key_manager_url = url(Scope::KeyAuth)?;
        let session_auth_url = url(Scope::SessionAuth)?;

        Ok(Self {
            hosts,
            datafeed,
            interceptor,
            pod_url,
            agent_url,
            key_manager_url,
            session_auth_url,
        })
    }

    /// Base URL for the pod host (pod endpoints and the unauthenticated echo)
    pub fn pod_url(&self) -> &str {
        &self.pod_url
    }

    pub fn agent_url(&self) -> &str {
        &self.agent_url
    }

    pub fn key_manager_url(&self) -> &str {
        &self.key_manager_url
    }

    pub fn session_auth_url(&self) -> &str {
        &self.session_auth_url
    }

    /// Base URL standing in for a logical host from the config
    pub fn url_for(&self, host: &str) -> Option<&str> {
        self.interceptor.url_for_host(host)
    }

    /// Every intercepted host with its URL and scopes
    pub fn bound_hosts(&self) -> &[BoundHost] {
        self.interceptor.hosts()
    }

    pub fn hosts(&self) -> &ResolvedHosts {
        &self.hosts
    }

    pub fn stream_id(&self) -> &'static str {
        STREAM_ID
    }

    pub fn datafeed_id(&self) -> &'static str {
        DATAFEED_ID
    }

    /// Fail the next `count` datafeed creations with a 400
    pub fn set_datafeed_create_http400_count(&self, count: u32) {
        self.datafeed.set_create_failures(count);
    }

    /// Fail the next `count` datafeed reads with a 400
    pub fn set_datafeed_read_http400_count(&self, count: u32) {
        self.datafeed.set_read_failures(count);
    }

    /// Messages queued for the next datafeed read
    pub fn pending_messages(&self) -> usize {
        self.datafeed.pending()
    }

    /// Receive a [`FixtureEvent::MessageReceived`] for every created message
    pub fn subscribe(&self) -> broadcast::Receiver<FixtureEvent> {
        self.datafeed.subscribe()
    }

    /// Stop intercepting every host and wait for the listeners to exit
    pub async fn close(self) {
        tracing::info!(host = %self.hosts.host, "Cleaning up mocks");
        self.interceptor.shutdown().await;
    }
}
