// ABOUTME: Scripted mock of the Symphony pod, agent, and auth APIs for client integration tests
// ABOUTME: Exposes the config, the scoped HTTP interceptor, and the MockServer built on them

pub mod config;
pub mod interceptor;
pub mod server;

pub use config::{MockConfig, ResolvedHosts};
pub use server::MockServer;

// Re-export fixture state and data from symphony-mock-core
pub use symphony_mock_core::{fixtures, message, room};
pub use symphony_mock_core::{DatafeedEvent, FixtureEvent, SymphonyMessage};
