// ABOUTME: Tests for the room payload builders
// ABOUTME: Checks the update merge, the active toggle, and that membership stays fixed

use serde_json::json;
use symphony_mock_core::fixtures::{BOT_USER_ID, REAL_USER_ID, STREAM_ID};
use symphony_mock_core::room::{self, KeyValuePair, MembershipAction, UpdateRoomPayload};

#[test]
fn test_update_echoes_mutable_fields_and_pins_immutable_ones() {
    let update = UpdateRoomPayload {
        name: Some("renamed".to_string()),
        description: Some("new description".to_string()),
        keywords: Some(vec![KeyValuePair {
            key: "team".to_string(),
            value: "ops".to_string(),
        }]),
        members_can_invite: Some(true),
        discoverable: Some(true),
        copy_protected: Some(true),
    };

    let json = serde_json::to_value(room::updated_room(update)).unwrap();
    assert_eq!(
        json["roomAttributes"],
        json!({
            "name": "renamed",
            "description": "new description",
            "keywords": [{"key": "team", "value": "ops"}],
            "membersCanInvite": true,
            "discoverable": true,
            "copyProtected": true,
            "readOnly": false,
            "public": false,
        })
    );
    assert_eq!(json["roomSystemInfo"]["id"], STREAM_ID);
    assert_eq!(json["roomSystemInfo"]["active"], true);
}

#[test]
fn test_update_ignores_smuggled_immutable_fields() {
    let update: UpdateRoomPayload =
        serde_json::from_value(json!({"name": "x", "readOnly": true, "public": true})).unwrap();
    let info = room::updated_room(update);
    assert_eq!(info.room_attributes.read_only, Some(false));
    assert_eq!(info.room_attributes.public, Some(false));
    assert_eq!(info.room_attributes.name.as_deref(), Some("x"));
    assert_eq!(info.room_attributes.description, None);
}

#[test]
fn test_set_active_reflects_flag() {
    assert!(room::set_active(room::parse_active_flag(Some("true"))).room_system_info.active);
    assert!(!room::set_active(room::parse_active_flag(Some("yes"))).room_system_info.active);
}

#[test]
fn test_membership_list_is_fixed() {
    let members = room::membership_list();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].id, BOT_USER_ID);
    assert!(members[0].owner);
    assert_eq!(members[1].id, REAL_USER_ID);
    assert!(!members[1].owner);

    let _ = room::membership_change(MembershipAction::Remove);
    assert_eq!(room::membership_list(), members);
}

#[test]
fn test_membership_list_wire_shape() {
    let json = serde_json::to_value(room::membership_list()).unwrap();
    assert_eq!(
        json[1],
        json!({"id": REAL_USER_ID, "owner": false, "joinDate": 1461430710531u64})
    );
}
