// ABOUTME: Fixed reference data shared by every mock server instance
// ABOUTME: Stream/datafeed ids, auth tokens, and the two user records with lookup by uid/email/username

use serde::{Deserialize, Serialize};

/// The one room/IM stream every scripted endpoint talks about
pub const STREAM_ID: &str = "WLwnGbzxIdU8ZmPUjAs_bn___qulefJUdA";

/// Id returned by datafeed creation and expected in the read path
pub const DATAFEED_ID: &str = "1234";

pub const SESSION_TOKEN: &str = "SESSION_TOKEN";
pub const KEY_MANAGER_TOKEN: &str = "KEY_MANAGER_TOKEN";

/// Header names the platform uses to carry the two tokens
pub const SESSION_TOKEN_HEADER: &str = "sessionToken";
pub const KEY_MANAGER_TOKEN_HEADER: &str = "keyManagerToken";

pub const FIRST_MESSAGE_ID: &str = "-sfAvIPTTmyrpORkBuvL_3___qulZoKedA";
pub const FIRST_MESSAGE_TIMESTAMP: &str = "1461808889185";

pub const ROOM_CREATION_DATE: u64 = 1464448273802;

pub const REAL_USER_ID: u64 = 7215545078229;
pub const REAL_USER_NAME: &str = "johndoe";
pub const REAL_USER_EMAIL: &str = "johndoe@symphony.com";

pub const BOT_USER_ID: u64 = 7696581411197;
pub const BOT_USER_NAME: &str = "mozart";
pub const BOT_USER_EMAIL: &str = "mozart@symphony.com";

/// A user as returned by `/pod/v2/user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: u64,
    pub email_address: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub display_name: String,
}

pub fn real_user() -> UserRecord {
    UserRecord {
        id: REAL_USER_ID,
        email_address: REAL_USER_EMAIL.to_string(),
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        username: REAL_USER_NAME.to_string(),
        display_name: "John Doe".to_string(),
    }
}

/// The bot's record. Its `id` is the real user's id, exactly as the platform
/// fixture serves it; lookups by `uid` still key on `BOT_USER_ID`.
pub fn bot_user() -> UserRecord {
    UserRecord {
        id: REAL_USER_ID,
        email_address: BOT_USER_EMAIL.to_string(),
        first_name: "Wolfgang Amadeus".to_string(),
        last_name: "Mozart".to_string(),
        username: BOT_USER_NAME.to_string(),
        display_name: "Mozart".to_string(),
    }
}

/// The single selector a user lookup is keyed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserQuery {
    Uid(u64),
    Email(String),
    Username(String),
}

impl UserQuery {
    /// Build a query from one `uid`/`email`/`username` query-string pair.
    /// A `uid` that is not a number never matches anyone.
    pub fn from_pair(key: &str, value: &str) -> Option<Self> {
        match key {
            "uid" => value.parse().ok().map(UserQuery::Uid),
            "email" => Some(UserQuery::Email(value.to_string())),
            "username" => Some(UserQuery::Username(value.to_string())),
            _ => None,
        }
    }
}

/// Resolve a lookup against the two fixed users
pub fn lookup_user(query: &UserQuery) -> Option<UserRecord> {
    [(REAL_USER_ID, real_user()), (BOT_USER_ID, bot_user())]
        .into_iter()
        .find(|(uid, user)| match query {
            UserQuery::Uid(id) => uid == id,
            UserQuery::Email(email) => user.email_address == *email,
            UserQuery::Username(name) => user.username == *name,
        })
        .map(|(_, user)| user)
}
