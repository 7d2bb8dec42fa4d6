//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{ClientId, Message, MessageKind, RoomName},
    infrastructure::dto::{
        http::{BroadcastResultDto, ClientDetailDto, ErrorDto, RoomSummaryDto},
        websocket::MessageDto,
    },
    router::DispatchOutcome,
    ui::state::AppState,
};

/// Sender stamped on admin broadcasts that do not name one.
const SYSTEM_SENDER: &str = "system";

type ErrorResponse = (StatusCode, Json<ErrorDto>);

fn bad_request(error: impl ToString) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorDto {
            error: error.to_string(),
        }),
    )
}

fn parse_client_id(value: String) -> Result<ClientId, StatusCode> {
    ClientId::try_from(value).map_err(|_| StatusCode::BAD_REQUEST)
}

fn parse_room(value: String) -> Result<RoomName, StatusCode> {
    RoomName::try_from(value).map_err(|_| StatusCode::BAD_REQUEST)
}

fn no_content_or_not_found(found: bool) -> StatusCode {
    if found {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of connected clients
pub async fn list_clients(State(state): State<Arc<AppState>>) -> Json<Vec<ClientDetailDto>> {
    let clients = state.router.manager().clients().await;

    // Domain Model から DTO への変換
    Json(clients.into_iter().map(ClientDetailDto::from).collect())
}

/// Get client detail by ID
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientDetailDto>, StatusCode> {
    let client_id = parse_client_id(client_id)?;
    state
        .router
        .manager()
        .get_client(&client_id)
        .await
        .map(|client| Json(ClientDetailDto::from(client)))
        .ok_or(StatusCode::NOT_FOUND)
}

/// Force-close a client connection
pub async fn close_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let client_id = parse_client_id(client_id)?;
    Ok(no_content_or_not_found(
        state.router.close_client(&client_id).await,
    ))
}

/// Add a client to a room
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Path((client_id, room)): Path<(String, String)>,
) -> Result<StatusCode, StatusCode> {
    let client_id = parse_client_id(client_id)?;
    let room = parse_room(room)?;
    Ok(no_content_or_not_found(
        state.router.join_room(&client_id, room).await,
    ))
}

/// Remove a client from a room
pub async fn leave_room(
    State(state): State<Arc<AppState>>,
    Path((client_id, room)): Path<(String, String)>,
) -> Result<StatusCode, StatusCode> {
    let client_id = parse_client_id(client_id)?;
    let room = parse_room(room)?;
    Ok(no_content_or_not_found(
        state.router.leave_room(&client_id, &room).await,
    ))
}

/// Get list of rooms
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.router.manager().rooms().await;
    Json(rooms.into_iter().map(RoomSummaryDto::from).collect())
}

/// Get room detail by name
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<RoomSummaryDto>, StatusCode> {
    let room = parse_room(room)?;
    state
        .router
        .manager()
        .room(&room)
        .await
        .map(|room| Json(RoomSummaryDto::from(room)))
        .ok_or(StatusCode::NOT_FOUND)
}

/// Enqueue a message to every connected client.
///
/// The body uses the wire message shape and is validated like an inbound
/// frame; read receipts are rejected.
pub async fn broadcast(
    State(state): State<Arc<AppState>>,
    Json(mut dto): Json<MessageDto>,
) -> Result<(StatusCode, Json<BroadcastResultDto>), ErrorResponse> {
    if dto.sender_id.trim().is_empty() {
        dto.sender_id = SYSTEM_SENDER.to_string();
    }
    let message = Message::try_from(dto).map_err(bad_request)?;
    if message.kind() == MessageKind::ReadReceipt {
        return Err(bad_request("read receipts cannot be broadcast"));
    }

    let outcome = state.router.broadcast_all(message).await;
    let (recipients, evicted) = match outcome {
        DispatchOutcome::Delivered {
            recipients,
            evicted,
        } => (recipients, evicted),
        _ => (0, Vec::new()),
    };
    tracing::info!("Broadcast enqueued for {} client(s)", recipients);

    Ok((
        StatusCode::ACCEPTED,
        Json(BroadcastResultDto {
            recipients,
            evicted: evicted.into_iter().map(|id| id.into_string()).collect(),
        }),
    ))
}
