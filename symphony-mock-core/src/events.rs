// ABOUTME: Notifications emitted by the fixture for tests to synchronize on
// ABOUTME: Currently only message receipt, published on a tokio broadcast channel

use crate::message::SymphonyMessage;

/// Something observable happened inside the fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureEvent {
    /// A message was appended to the queue
    MessageReceived(SymphonyMessage),
}
