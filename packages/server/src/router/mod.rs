//! Message router: connection registry, rooms, dispatch and heartbeat.
//!
//! [`MessageRouter`] is the entry point embedders use. It owns the
//! [`ConnectionManager`] plus the collaborators a session needs (wire codec and
//! an optional message store), and is passed by value to whoever needs it
//! instead of living in a global.

mod client;
mod config;
mod heartbeat;
mod manager;
mod session;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tsunagi_shared::time::Clock;

use crate::domain::{
    ClientId, FrameReader, FrameWriter, Message, MessageCodec, MessageKind, MessageStore, RoomName,
    ValidationError,
};

pub use client::{ClientHandle, ClientSnapshot, Outbox};
pub use config::{
    ConfigError, DEFAULT_OUTBOX_CAPACITY, DEFAULT_PING_PERIOD, DEFAULT_PONG_WAIT,
    DEFAULT_WRITE_WAIT, RouterConfig,
};
pub use manager::{ConnectionManager, DispatchOutcome, RoomSnapshot};

use session::ClientSession;

#[derive(Clone)]
pub struct MessageRouter {
    manager: ConnectionManager,
    codec: Arc<dyn MessageCodec>,
    store: Option<Arc<dyn MessageStore>>,
    config: RouterConfig,
}

/// A connection accepted by [`MessageRouter::connect`].
pub struct Connection {
    handle: ClientHandle,
    task: JoinHandle<()>,
}

impl Connection {
    pub fn handle(&self) -> &ClientHandle {
        &self.handle
    }

    /// Wait until both loops of the session have finished.
    pub async fn closed(self) {
        if let Err(e) = self.task.await {
            tracing::error!("Session task for '{}' failed: {}", self.handle.id(), e);
        }
    }
}

impl MessageRouter {
    pub fn new(config: RouterConfig, codec: Arc<dyn MessageCodec>) -> Self {
        Self {
            manager: ConnectionManager::new(&config),
            codec,
            store: None,
            config,
        }
    }

    pub fn with_clock(config: RouterConfig, codec: Arc<dyn MessageCodec>, clock: Arc<dyn Clock>) -> Self {
        Self {
            manager: ConnectionManager::with_clock(&config, clock),
            codec,
            store: None,
            config,
        }
    }

    /// Enable fire-and-forget persistence.
    pub fn with_store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn codec(&self) -> &dyn MessageCodec {
        self.codec.as_ref()
    }

    /// Register an upgraded connection and spawn its session.
    ///
    /// Any existing connection with the same identity is closed first.
    pub async fn connect<R, W>(&self, client_id: ClientId, reader: R, writer: W) -> Connection
    where
        R: FrameReader,
        W: FrameWriter,
    {
        let (handle, outbox) = self.manager.register(client_id).await;
        let session = ClientSession::new(self.clone(), handle.clone(), outbox, reader, writer);
        let task = tokio::spawn(session.run());
        Connection { handle, task }
    }

    /// Handle one text payload received on `handle`'s connection.
    ///
    /// Read receipts are recorded in the store and never rebroadcast; every
    /// other kind is persisted (if a store is configured) and dispatched.
    pub async fn handle_inbound(
        &self,
        handle: &ClientHandle,
        payload: &str,
    ) -> Result<DispatchOutcome, ValidationError> {
        let message = self.codec.decode(payload, handle.id())?;

        if message.kind() == MessageKind::ReadReceipt {
            self.mark_as_read(&message);
            return Ok(DispatchOutcome::NotRoutable);
        }

        self.persist(&message);
        let outcome = self.manager.dispatch(message).await;
        match &outcome {
            DispatchOutcome::RecipientOffline(receiver_id) => {
                tracing::debug!("Recipient '{}' offline; message dropped", receiver_id);
            }
            DispatchOutcome::RoomNotFound(room) => {
                tracing::debug!("Room '{}' not found; message dropped", room);
            }
            _ => {}
        }
        Ok(outcome)
    }

    /// Save a routed message on a background task. Never blocks dispatch.
    fn persist(&self, message: &Message) -> Option<JoinHandle<()>> {
        let store = self.store.clone()?;
        let message = message.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = store.save(&message).await {
                tracing::warn!("Failed to persist {} message: {}", message.kind(), e);
            }
        }))
    }

    fn mark_as_read(&self, message: &Message) -> Option<JoinHandle<()>> {
        let message_id = message.message_id()?.clone();
        let user_id = message.sender_id().clone();
        let Some(store) = self.store.clone() else {
            tracing::debug!(
                "Read receipt for '{}' from '{}' ignored (no store configured)",
                message_id,
                user_id
            );
            return None;
        };

        Some(tokio::spawn(async move {
            if let Err(e) = store.mark_as_read(&user_id, &message_id).await {
                tracing::warn!("Failed to mark message '{}' as read: {}", message_id, e);
            }
        }))
    }

    pub async fn dispatch(&self, message: Message) -> DispatchOutcome {
        self.manager.dispatch(message).await
    }

    pub async fn broadcast_all(&self, message: Message) -> DispatchOutcome {
        self.manager.broadcast_all(message).await
    }

    pub async fn join_room(&self, client_id: &ClientId, room: RoomName) -> bool {
        self.manager.join_room(client_id, room).await
    }

    pub async fn leave_room(&self, client_id: &ClientId, room: &RoomName) -> bool {
        self.manager.leave_room(client_id, room).await
    }

    pub async fn close_client(&self, client_id: &ClientId) -> bool {
        self.manager.close_client(client_id).await
    }

    /// Close every connection. Called once the HTTP server has stopped.
    pub async fn shutdown(&self) -> usize {
        self.manager.shutdown().await
    }
}
