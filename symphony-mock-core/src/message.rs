// ABOUTME: Message records held in the mock's queue and the datafeed envelope they are delivered in
// ABOUTME: Serializes with the platform's camelCase field names

use serde::{Deserialize, Serialize};

use crate::fixtures::{
    BOT_USER_ID, FIRST_MESSAGE_ID, FIRST_MESSAGE_TIMESTAMP, REAL_USER_ID, STREAM_ID,
};

/// Event type tag for every datafeed entry the mock produces
pub const MESSAGE_SENT: &str = "MESSAGESENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRef {
    pub stream_id: String,
}

/// A message as stored in the queue and returned by message creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymphonyMessage {
    pub message_id: String,
    /// Epoch milliseconds, as a string
    pub timestamp: String,
    /// MessageML body
    pub message: String,
    pub user: UserRef,
    pub stream: StreamRef,
}

impl SymphonyMessage {
    /// The message a fresh fixture starts with
    pub fn hello_world() -> Self {
        Self {
            message_id: FIRST_MESSAGE_ID.to_string(),
            timestamp: FIRST_MESSAGE_TIMESTAMP.to_string(),
            message: "<messageML>Hello World</messageML>".to_string(),
            user: UserRef {
                user_id: REAL_USER_ID,
            },
            stream: StreamRef {
                stream_id: STREAM_ID.to_string(),
            },
        }
    }

    /// A newly posted bot message with a unique id and the current time
    pub fn sent_by_bot(body: &str) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp_millis().to_string(),
            message: body.to_string(),
            user: UserRef {
                user_id: BOT_USER_ID,
            },
            stream: StreamRef {
                stream_id: STREAM_ID.to_string(),
            },
        }
    }
}

/// Body accepted by `/agent/v4/stream/{id}/message/create`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMessagePayload {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub message_sent: SymphonyMessage,
}

/// One entry of a datafeed read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatafeedEvent {
    pub id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub initiator: UserRef,
    pub payload: EventPayload,
}

impl From<SymphonyMessage> for DatafeedEvent {
    fn from(msg: SymphonyMessage) -> Self {
        Self {
            id: msg.message_id.clone(),
            timestamp: msg.timestamp.clone(),
            event_type: MESSAGE_SENT.to_string(),
            initiator: msg.user,
            payload: EventPayload { message_sent: msg },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hello_world_wire_shape() {
        let json = serde_json::to_value(SymphonyMessage::hello_world()).unwrap();
        assert_eq!(
            json,
            json!({
                "messageId": FIRST_MESSAGE_ID,
                "timestamp": FIRST_MESSAGE_TIMESTAMP,
                "message": "<messageML>Hello World</messageML>",
                "user": {"userId": REAL_USER_ID},
                "stream": {"streamId": STREAM_ID},
            })
        );
    }

    #[test]
    fn test_sent_by_bot_gets_unique_ids() {
        let a = SymphonyMessage::sent_by_bot("one");
        let b = SymphonyMessage::sent_by_bot("two");
        assert_ne!(a.message_id, b.message_id);
        assert_eq!(a.user.user_id, BOT_USER_ID);
        assert!(a.timestamp.parse::<i64>().is_ok());
    }

    #[test]
    fn test_datafeed_event_wraps_message() {
        let msg = SymphonyMessage::hello_world();
        let json = serde_json::to_value(DatafeedEvent::from(msg.clone())).unwrap();
        assert_eq!(json["id"], FIRST_MESSAGE_ID);
        assert_eq!(json["type"], MESSAGE_SENT);
        assert_eq!(json["initiator"]["userId"], REAL_USER_ID);
        assert_eq!(json["payload"]["messageSent"], serde_json::to_value(msg).unwrap());
    }

    #[test]
    fn test_create_payload_tolerates_missing_format() {
        let payload: CreateMessagePayload =
            serde_json::from_str(r#"{"message": "<messageML>hi</messageML>"}"#).unwrap();
        assert_eq!(payload.message, "<messageML>hi</messageML>");
        assert_eq!(payload.format, None);
    }
}
