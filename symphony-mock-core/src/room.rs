// ABOUTME: Room management payloads served by the pod endpoints
// ABOUTME: Pure builders: none of them touch fixture state, each is a function of its request

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fixtures::{BOT_USER_ID, REAL_USER_ID, ROOM_CREATION_DATE, STREAM_ID};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
}

/// Room attributes. Fields left as `None` are omitted from the JSON, which
/// is how the different endpoints end up with different attribute sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<KeyValuePair>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members_can_invite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discoverable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_protected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

/// Body accepted by `/pod/v2/room/{id}/update`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<KeyValuePair>>,
    #[serde(default)]
    pub members_can_invite: Option<bool>,
    #[serde(default)]
    pub discoverable: Option<bool>,
    #[serde(default)]
    pub copy_protected: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImmutableRoomAttributes {
    pub read_only: bool,
    pub copy_protected: bool,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSystemInfo {
    pub id: String,
    pub creation_date: u64,
    pub created_by_user_id: u64,
    pub active: bool,
}

/// Room info envelope. Room creation echoes arbitrary attributes back, so
/// the attribute type is a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo<A = RoomAttributes> {
    pub room_attributes: A,
    pub room_system_info: RoomSystemInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immutable_room_attributes: Option<ImmutableRoomAttributes>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: u64,
    pub owner: bool,
    pub join_date: u64,
}

/// Plain-text confirmation returned by the membership mutation endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipConfirmation {
    pub format: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipAction {
    Add,
    Remove,
    PromoteOwner,
    DemoteOwner,
}

impl MembershipAction {
    pub const ALL: [MembershipAction; 4] = [
        MembershipAction::Add,
        MembershipAction::Remove,
        MembershipAction::PromoteOwner,
        MembershipAction::DemoteOwner,
    ];

    /// Final path segment of the endpoint, e.g. `promoteOwner`
    pub fn path_segment(self) -> &'static str {
        match self {
            MembershipAction::Add => "add",
            MembershipAction::Remove => "remove",
            MembershipAction::PromoteOwner => "promoteOwner",
            MembershipAction::DemoteOwner => "demoteOwner",
        }
    }

    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.path_segment() == segment)
    }

    fn confirmation_text(self) -> &'static str {
        match self {
            MembershipAction::Add => "Member added",
            MembershipAction::Remove => "Member removed",
            MembershipAction::PromoteOwner => "Member promoted to owner",
            MembershipAction::DemoteOwner => "Member demoted to participant",
        }
    }
}

fn system_info(active: bool) -> RoomSystemInfo {
    RoomSystemInfo {
        id: STREAM_ID.to_string(),
        creation_date: ROOM_CREATION_DATE,
        created_by_user_id: BOT_USER_ID,
        active,
    }
}

fn fixed_attributes() -> RoomAttributes {
    RoomAttributes {
        name: Some("foo".to_string()),
        description: Some("bar".to_string()),
        keywords: Some(vec![KeyValuePair {
            key: "x".to_string(),
            value: "y".to_string(),
        }]),
        members_can_invite: Some(false),
        discoverable: Some(false),
        ..Default::default()
    }
}

/// Response to room creation: the submitted attributes verbatim
pub fn created_room(attributes: Value) -> RoomInfo<Value> {
    RoomInfo {
        room_attributes: attributes,
        room_system_info: system_info(true),
        immutable_room_attributes: None,
    }
}

/// Response to `/pod/v2/room/{id}/info`
pub fn room_info() -> RoomInfo {
    RoomInfo {
        room_attributes: RoomAttributes {
            read_only: Some(false),
            copy_protected: Some(false),
            public: Some(false),
            ..fixed_attributes()
        },
        room_system_info: system_info(true),
        immutable_room_attributes: None,
    }
}

/// Interpret the `active` query flag; only the literal `true` counts
pub fn parse_active_flag(value: Option<&str>) -> bool {
    value == Some("true")
}

/// Response to `/pod/v1/room/{id}/setActive`
pub fn set_active(active: bool) -> RoomInfo {
    RoomInfo {
        room_attributes: fixed_attributes(),
        room_system_info: system_info(active),
        immutable_room_attributes: Some(ImmutableRoomAttributes {
            read_only: false,
            copy_protected: false,
            public: false,
        }),
    }
}

/// Response to `/pod/v2/room/{id}/update`: the mutable fields as submitted,
/// with `readOnly` and `public` pinned to false
pub fn updated_room(update: UpdateRoomPayload) -> RoomInfo {
    RoomInfo {
        room_attributes: RoomAttributes {
            name: update.name,
            description: update.description,
            keywords: update.keywords,
            members_can_invite: update.members_can_invite,
            discoverable: update.discoverable,
            copy_protected: update.copy_protected,
            read_only: Some(false),
            public: Some(false),
        },
        room_system_info: system_info(true),
        immutable_room_attributes: None,
    }
}

/// The fixed two-member list; membership mutations never change it
pub fn membership_list() -> Vec<Member> {
    vec![
        Member {
            id: BOT_USER_ID,
            owner: true,
            join_date: 1461426797875,
        },
        Member {
            id: REAL_USER_ID,
            owner: false,
            join_date: 1461430710531,
        },
    ]
}

pub fn membership_change(action: MembershipAction) -> MembershipConfirmation {
    MembershipConfirmation {
        format: "TEXT".to_string(),
        message: action.confirmation_text().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_active_flag_only_accepts_literal_true() {
        assert!(parse_active_flag(Some("true")));
        assert!(!parse_active_flag(Some("false")));
        assert!(!parse_active_flag(Some("TRUE")));
        assert!(!parse_active_flag(Some("1")));
        assert!(!parse_active_flag(Some("")));
        assert!(!parse_active_flag(None));
    }

    #[test]
    fn test_room_info_has_all_attributes() {
        let json = serde_json::to_value(room_info()).unwrap();
        let attrs = json["roomAttributes"].as_object().unwrap();
        assert_eq!(attrs.len(), 8);
        assert_eq!(json["roomAttributes"]["keywords"], json!([{"key": "x", "value": "y"}]));
        assert!(json.get("immutableRoomAttributes").is_none());
    }

    #[test]
    fn test_set_active_moves_flags_to_immutable_block() {
        let json = serde_json::to_value(set_active(false)).unwrap();
        assert_eq!(json["roomSystemInfo"]["active"], false);
        assert!(json["roomAttributes"].get("readOnly").is_none());
        assert_eq!(
            json["immutableRoomAttributes"],
            json!({"readOnly": false, "copyProtected": false, "public": false})
        );
    }

    #[test]
    fn test_created_room_echoes_attributes() {
        let attrs = json!({"name": "room", "public": true, "extra": [1, 2]});
        let info = created_room(attrs.clone());
        assert_eq!(info.room_attributes, attrs);
        assert_eq!(info.room_system_info.created_by_user_id, BOT_USER_ID);
        assert!(info.room_system_info.active);
    }

    #[test]
    fn test_membership_segments() {
        let segments: Vec<_> = MembershipAction::ALL.iter().map(|a| a.path_segment()).collect();
        assert_eq!(segments, vec!["add", "remove", "promoteOwner", "demoteOwner"]);
        assert_eq!(
            MembershipAction::from_path_segment("promoteOwner"),
            Some(MembershipAction::PromoteOwner)
        );
        assert_eq!(MembershipAction::from_path_segment("promoteowner"), None);
        assert_eq!(
            membership_change(MembershipAction::DemoteOwner).message,
            "Member demoted to participant"
        );
    }
}
