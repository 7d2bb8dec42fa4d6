//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::router::MessageRouter;

use super::{
    handler::{
        broadcast, close_client, get_client, get_room, health_check, join_room, leave_room,
        list_clients, list_rooms, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket message router server
///
/// # Example
///
/// ```ignore
/// let router = MessageRouter::new(RouterConfig::default(), Arc::new(JsonMessageCodec));
/// Server::new(router).run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    router: MessageRouter,
}

impl Server {
    pub fn new(router: MessageRouter) -> Self {
        Self { router }
    }

    /// Build the axum application.
    pub fn app(&self) -> Router {
        let app_state = Arc::new(AppState {
            router: self.router.clone(),
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/clients", get(list_clients))
            .route("/api/clients/{client_id}", get(get_client).delete(close_client))
            .route(
                "/api/clients/{client_id}/rooms/{room}",
                put(join_room).delete(leave_room),
            )
            .route("/api/rooms", get(list_rooms))
            .route("/api/rooms/{room}", get(get_room))
            .route("/api/broadcast", post(broadcast))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Bind to `host:port` and serve until Ctrl+C / SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Message router listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?client_id=<id>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }

    /// Serve on an already-bound listener until `shutdown` resolves, then
    /// close every remaining client connection.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.app();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        let closed = self.router.shutdown().await;
        tracing::info!("Server shutdown complete ({} connection(s) closed)", closed);

        Ok(())
    }
}
