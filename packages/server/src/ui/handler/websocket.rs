//! WebSocket connection handler.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{domain::ClientId, infrastructure::connection::split, ui::state::AppState};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub client_id: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> ClientId (Domain Model)
    let client_id = match ClientId::try_from(query.client_id) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Rejected WebSocket upgrade: invalid client_id ({})", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, client_id)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, client_id: ClientId) {
    let (reader, writer) = split(socket);

    // 同じ ID の既存接続があれば、ここで切断される（新しい接続が勝つ）
    let connection = state.router.connect(client_id.clone(), reader, writer).await;
    tracing::info!("Client '{}' connected", client_id);

    connection.closed().await;
    tracing::info!("Client '{}' disconnected", client_id);
}
