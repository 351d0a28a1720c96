// ABOUTME: Platform-agnostic fixture state for the Symphony mock server
// ABOUTME: Holds the fixed reference data, payload builders, and the datafeed message queue

pub mod datafeed;
pub mod events;
pub mod fixtures;
pub mod message;
pub mod room;

pub use datafeed::{CreateOutcome, DatafeedState, ReadOutcome};
pub use events::FixtureEvent;
pub use fixtures::{UserQuery, UserRecord};
pub use message::{DatafeedEvent, SymphonyMessage};
