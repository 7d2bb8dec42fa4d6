//! ConnectionManager: the single authority over live clients and rooms.
//!
//! ## 設計
//!
//! - クライアントテーブル（`ClientId` → `ClientRecord`）とルームテーブル
//!   （`RoomName` → `Room`）を 1 つの Mutex で保護する
//! - `Room.members` と `ClientRecord.rooms` は常にペアで更新する
//! - outbox への enqueue は `try_send` のみ（ロック中でも待たない）。満杯なら
//!   そのクライアントを切断する（バックプレッシャー方針）
//! - deregister は冪等。置き換え済みの古いハンドルからの呼び出しは無視する

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, mpsc::error::TrySendError};
use tsunagi_shared::time::{Clock, SystemClock};

use crate::domain::{ClientId, Message, MessageKind, Room, RoomName, Timestamp};

use super::{
    client::{ClientHandle, ClientRecord, ClientSnapshot, Outbox},
    config::RouterConfig,
};

/// Result of routing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Enqueued to `recipients` outboxes; `evicted` clients had a full or
    /// closed outbox and were disconnected instead.
    Delivered {
        recipients: usize,
        evicted: Vec<ClientId>,
    },
    /// The receiver of a private message or notification is not connected.
    RecipientOffline(ClientId),
    /// The target room of a group message does not exist.
    RoomNotFound(RoomName),
    /// Read receipts are handled by the session, never routed.
    NotRoutable,
}

impl DispatchOutcome {
    /// Number of outboxes the message was enqueued to.
    pub fn recipients(&self) -> usize {
        match self {
            Self::Delivered { recipients, .. } => *recipients,
            _ => 0,
        }
    }
}

/// Point-in-time view of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub name: RoomName,
    /// Sorted by id.
    pub members: Vec<ClientId>,
}

impl From<&Room> for RoomSnapshot {
    fn from(room: &Room) -> Self {
        let mut members = room.members();
        members.sort();
        Self {
            name: room.name().clone(),
            members,
        }
    }
}

#[derive(Debug, Default)]
struct RouterState {
    clients: HashMap<ClientId, ClientRecord>,
    rooms: HashMap<RoomName, Room>,
}

impl RouterState {
    /// Remove a client from the client table and every room it belongs to.
    ///
    /// Dropping the returned record drops the only sender of its outbox, which
    /// lets the write loop drain and exit; the handle's terminate signal stops
    /// the read loop.
    fn remove_client(&mut self, client_id: &ClientId) -> Option<ClientRecord> {
        let record = self.clients.remove(client_id)?;
        for room_name in &record.rooms {
            let now_empty = match self.rooms.get_mut(room_name) {
                Some(room) => {
                    room.remove(client_id);
                    room.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.rooms.remove(room_name);
                tracing::debug!("Room '{}' removed (no members left)", room_name);
            }
        }
        record.handle.terminate();
        Some(record)
    }

    /// Non-blocking enqueue. Returns `false` when the client is missing or was evicted.
    fn enqueue(&mut self, client_id: &ClientId, message: Message, evicted: &mut Vec<ClientId>) -> bool {
        let Some(record) = self.clients.get(client_id) else {
            return false;
        };

        match record.outbox.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    "Outbox of client '{}' is full; disconnecting slow client",
                    client_id
                );
                self.remove_client(client_id);
                evicted.push(client_id.clone());
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("Outbox of client '{}' is closed; removing client", client_id);
                self.remove_client(client_id);
                evicted.push(client_id.clone());
                false
            }
        }
    }

    fn leave(&mut self, client_id: &ClientId, room_name: &RoomName) -> bool {
        let Some(record) = self.clients.get_mut(client_id) else {
            return false;
        };
        let was_member = record.rooms.remove(room_name);

        let now_empty = match self.rooms.get_mut(room_name) {
            Some(room) => {
                room.remove(client_id);
                room.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.rooms.remove(room_name);
            tracing::debug!("Room '{}' removed (no members left)", room_name);
        }

        was_member
    }
}

/// Registry of live clients and rooms, and the dispatch entry point.
///
/// Cheap to clone; all clones share the same tables.
#[derive(Clone)]
pub struct ConnectionManager {
    state: Arc<Mutex<RouterState>>,
    clock: Arc<dyn Clock>,
    outbox_capacity: usize,
}

impl ConnectionManager {
    pub fn new(config: &RouterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RouterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RouterState::default())),
            clock,
            outbox_capacity: config.outbox_capacity(),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// Register a new connection under `client_id`.
    ///
    /// If the identity is already registered, the previous client is
    /// deregistered first: the newest connection wins.
    pub async fn register(&self, client_id: ClientId) -> (ClientHandle, Outbox) {
        let handle = ClientHandle::new(client_id.clone(), self.now());
        let (record, outbox) = ClientRecord::new(handle.clone(), self.outbox_capacity);

        let mut state = self.state.lock().await;
        if state.remove_client(&client_id).is_some() {
            tracing::info!(
                "Client '{}' reconnected; previous connection evicted",
                client_id
            );
        }
        state.clients.insert(client_id.clone(), record);
        tracing::info!(
            "Client '{}' registered ({} connected)",
            client_id,
            state.clients.len()
        );

        (handle, outbox)
    }

    /// Deregister the client behind `handle`.
    ///
    /// Idempotent: returns `false` without touching the tables when the handle
    /// is no longer the table's entry for its identity (already removed, or
    /// replaced by a newer connection).
    pub async fn deregister(&self, handle: &ClientHandle) -> bool {
        let mut state = self.state.lock().await;
        let is_current = state
            .clients
            .get(handle.id())
            .is_some_and(|record| record.handle.is_same_session(handle));
        if !is_current {
            handle.terminate();
            return false;
        }

        state.remove_client(handle.id());
        tracing::info!(
            "Client '{}' deregistered ({} connected)",
            handle.id(),
            state.clients.len()
        );
        true
    }

    /// Administrative forced close ("kick"). Returns `false` if not registered.
    pub async fn close_client(&self, client_id: &ClientId) -> bool {
        let mut state = self.state.lock().await;
        let closed = state.remove_client(client_id).is_some();
        if closed {
            tracing::info!("Client '{}' closed by request", client_id);
        }
        closed
    }

    /// Add the client to the room, creating the room on first join.
    ///
    /// Returns `false` if the client is not registered. Joining twice is a no-op.
    pub async fn join_room(&self, client_id: &ClientId, room_name: RoomName) -> bool {
        let mut state = self.state.lock().await;
        let RouterState { clients, rooms } = &mut *state;

        let Some(record) = clients.get_mut(client_id) else {
            return false;
        };
        if record.rooms.insert(room_name.clone()) {
            tracing::debug!("Client '{}' joined room '{}'", client_id, room_name);
        }
        rooms
            .entry(room_name.clone())
            .or_insert_with(|| Room::new(room_name))
            .add(client_id.clone());
        true
    }

    /// Remove the client from the room, dropping the room once empty.
    ///
    /// Returns `false` if the client or the membership is absent.
    pub async fn leave_room(&self, client_id: &ClientId, room_name: &RoomName) -> bool {
        let mut state = self.state.lock().await;
        let left = state.leave(client_id, room_name);
        if left {
            tracing::debug!("Client '{}' left room '{}'", client_id, room_name);
        }
        left
    }

    /// Route one message by kind.
    ///
    /// - `private` / `notification`: to the receiver's outbox
    /// - `group`: to every member of the room
    /// - `read-receipt`: not routed
    ///
    /// A missing receiver or room drops the message.
    pub async fn dispatch(&self, message: Message) -> DispatchOutcome {
        match message.kind() {
            MessageKind::Private | MessageKind::Notification => {
                let Some(receiver_id) = message.receiver_id().cloned() else {
                    return DispatchOutcome::NotRoutable;
                };
                let mut state = self.state.lock().await;
                if !state.clients.contains_key(&receiver_id) {
                    tracing::debug!(
                        "Receiver '{}' is offline; {} message dropped",
                        receiver_id,
                        message.kind()
                    );
                    return DispatchOutcome::RecipientOffline(receiver_id);
                }

                let mut evicted = Vec::new();
                let recipients = usize::from(state.enqueue(&receiver_id, message, &mut evicted));
                DispatchOutcome::Delivered {
                    recipients,
                    evicted,
                }
            }
            MessageKind::Group => {
                let Some(room_name) = message.room().cloned() else {
                    return DispatchOutcome::NotRoutable;
                };
                let mut state = self.state.lock().await;
                let Some(members) = state.rooms.get(&room_name).map(Room::members) else {
                    tracing::debug!("Room '{}' does not exist; group message dropped", room_name);
                    return DispatchOutcome::RoomNotFound(room_name);
                };

                let mut evicted = Vec::new();
                let recipients = members
                    .iter()
                    .filter(|member| state.enqueue(member, message.clone(), &mut evicted))
                    .count();
                tracing::debug!(
                    "Group message to '{}' enqueued for {} member(s)",
                    room_name,
                    recipients
                );
                DispatchOutcome::Delivered {
                    recipients,
                    evicted,
                }
            }
            MessageKind::ReadReceipt => DispatchOutcome::NotRoutable,
        }
    }

    /// Enqueue to every live client regardless of kind, with the same
    /// backpressure policy as [`ConnectionManager::dispatch`].
    pub async fn broadcast_all(&self, message: Message) -> DispatchOutcome {
        let mut state = self.state.lock().await;
        let targets: Vec<ClientId> = state.clients.keys().cloned().collect();

        let mut evicted = Vec::new();
        let recipients = targets
            .iter()
            .filter(|target| state.enqueue(target, message.clone(), &mut evicted))
            .count();
        tracing::debug!("Broadcast enqueued for {} client(s)", recipients);

        DispatchOutcome::Delivered {
            recipients,
            evicted,
        }
    }

    pub async fn get_client(&self, client_id: &ClientId) -> Option<ClientSnapshot> {
        let state = self.state.lock().await;
        state.clients.get(client_id).map(ClientRecord::snapshot)
    }

    /// All registered clients, sorted by id.
    pub async fn clients(&self) -> Vec<ClientSnapshot> {
        let state = self.state.lock().await;
        let mut clients: Vec<ClientSnapshot> =
            state.clients.values().map(ClientRecord::snapshot).collect();
        clients.sort_by(|a, b| a.id.cmp(&b.id));
        clients
    }

    pub async fn client_count(&self) -> usize {
        self.state.lock().await.clients.len()
    }

    pub async fn room(&self, room_name: &RoomName) -> Option<RoomSnapshot> {
        let state = self.state.lock().await;
        state.rooms.get(room_name).map(RoomSnapshot::from)
    }

    /// Members of a room, sorted by id. `None` if the room does not exist.
    pub async fn room_members(&self, room_name: &RoomName) -> Option<Vec<ClientId>> {
        self.room(room_name).await.map(|room| room.members)
    }

    /// All rooms, sorted by name.
    pub async fn rooms(&self) -> Vec<RoomSnapshot> {
        let state = self.state.lock().await;
        let mut rooms: Vec<RoomSnapshot> = state.rooms.values().map(RoomSnapshot::from).collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        rooms
    }

    /// Deregister every client. Returns how many were connected.
    pub async fn shutdown(&self) -> usize {
        let mut state = self.state.lock().await;
        let ids: Vec<ClientId> = state.clients.keys().cloned().collect();
        for id in &ids {
            state.remove_client(id);
        }
        tracing::info!("Connection manager shut down ({} client(s) closed)", ids.len());
        ids.len()
    }
}
