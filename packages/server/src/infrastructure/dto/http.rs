//! HTTP API response and request DTOs.

use serde::{Deserialize, Serialize};

/// Client summary/detail for `GET /api/clients[/{client_id}]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetailDto {
    pub client_id: String,
    /// RFC 3339 (JST)
    pub connected_at: Option<String>,
    /// RFC 3339 (JST)
    pub last_seen: Option<String>,
    pub rooms: Vec<String>,
}

/// Room summary for `GET /api/rooms[/{room}]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub name: String,
    pub members: Vec<String>,
}

/// Response of `POST /api/broadcast`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResultDto {
    pub recipients: usize,
    pub evicted: Vec<String>,
}

/// Error body for 4xx responses carrying a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}
