// ABOUTME: Standalone runner for the Symphony mock server
// ABOUTME: Loads config and CLI overrides, prints the intercepted host URLs, and serves until Ctrl-C

use anyhow::{Context, Result};
use clap::Parser;
use symphony_mock::{FixtureEvent, MockConfig, MockServer};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "symphony-mock", about = "Scripted Symphony pod/agent/auth API for local testing")]
struct Cli {
    /// Pod host (also the default for every other host)
    #[arg(long)]
    host: Option<String>,

    /// Key manager host
    #[arg(long)]
    km_host: Option<String>,

    /// Agent host
    #[arg(long)]
    agent_host: Option<String>,

    /// Session auth host (defaults to the agent host)
    #[arg(long)]
    session_auth_host: Option<String>,

    /// Start with an empty message queue
    #[arg(long)]
    no_hello_world: bool,

    /// Number of datafeed creations to fail with HTTP 400
    #[arg(long, default_value_t = 0)]
    datafeed_create_failures: u32,

    /// Number of datafeed reads to fail with HTTP 400
    #[arg(long, default_value_t = 0)]
    datafeed_read_failures: u32,
}

impl Cli {
    fn apply(&self, mut config: MockConfig) -> MockConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(host) = &self.km_host {
            config.km_host = Some(host.clone());
        }
        if let Some(host) = &self.agent_host {
            config.agent_host = Some(host.clone());
        }
        if let Some(host) = &self.session_auth_host {
            config.session_auth_host = Some(host.clone());
        }
        if self.no_hello_world {
            config.start_with_hello_world_message = false;
        }
        config
    }
}

fn init_tracing() {
    let filter = std::env::var("SYMPHONY_MOCK_LOG_LEVEL")
        .ok()
        .and_then(|level| tracing_subscriber::EnvFilter::try_new(level).ok())
        .or_else(|| tracing_subscriber::EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| "info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = cli.apply(MockConfig::load()?);
    config.validate()?;

    let server = MockServer::start(config).await?;
    server.set_datafeed_create_http400_count(cli.datafeed_create_failures);
    server.set_datafeed_read_http400_count(cli.datafeed_read_failures);

    for bound in server.bound_hosts() {
        println!("{} -> {} {:?}", bound.host, bound.url, bound.scopes);
    }

    let mut events = server.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(FixtureEvent::MessageReceived(msg)) => {
                    tracing::info!(
                        message_id = %msg.message_id,
                        body = %msg.message,
                        "Message queued"
                    );
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    server.close().await;
    Ok(())
}
