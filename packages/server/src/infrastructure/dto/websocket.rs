//! WebSocket wire message.

use serde::{Deserialize, Serialize};

/// JSON shape of one message frame.
///
/// ```json
/// {"type": "group", "content": "hi", "sender_id": "alice", "room": "general"}
/// ```
///
/// `group_id` is accepted in place of `room` for older clients. When both are
/// present, `room` wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    /// `private` / `group` / `notification` / `mark_as_read`
    ///
    /// Kept as a string so an unknown kind surfaces as a validation error
    /// rather than a parse error.
    pub r#type: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing)]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}
