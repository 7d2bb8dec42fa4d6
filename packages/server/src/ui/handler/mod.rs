//! HTTP and WebSocket handlers.

mod http;
mod websocket;

pub use http::{
    broadcast, close_client, get_client, get_room, health_check, join_room, leave_room,
    list_clients, list_rooms,
};
pub use websocket::websocket_handler;
