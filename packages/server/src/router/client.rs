//! The router's view of one connected client.
//!
//! The manager's client table owns a [`ClientRecord`] per identity: the only
//! sending half of the client's outbox plus the client-local mirror of its
//! room memberships. Everything outside the manager holds a cheap
//! [`ClientHandle`] instead.

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::{ClientId, Message, RoomName, Timestamp};

/// Handle to one registered connection.
///
/// Two handles for the same identity are distinguished by their session id,
/// so a stale handle from a replaced connection never deregisters its
/// successor.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ClientId,
    session_id: Uuid,
    connected_at: Timestamp,
    last_seen: Arc<AtomicI64>,
    terminate: CancellationToken,
}

impl ClientHandle {
    pub(crate) fn new(id: ClientId, connected_at: Timestamp) -> Self {
        Self {
            id,
            session_id: Uuid::new_v4(),
            connected_at,
            last_seen: Arc::new(AtomicI64::new(connected_at.value())),
            terminate: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    pub fn last_seen(&self) -> Timestamp {
        Timestamp::new(self.last_seen.load(Ordering::Relaxed))
    }

    /// Refresh liveness on an inbound frame or pong.
    pub fn touch(&self, now: Timestamp) {
        self.last_seen.fetch_max(now.value(), Ordering::Relaxed);
    }

    /// Whether the client has been deregistered.
    pub fn is_terminated(&self) -> bool {
        self.terminate.is_cancelled()
    }

    /// Resolves once the client has been deregistered.
    pub async fn terminated(&self) {
        self.terminate.cancelled().await;
    }

    pub(crate) fn terminate(&self) {
        self.terminate.cancel();
    }

    pub(crate) fn is_same_session(&self, other: &ClientHandle) -> bool {
        self.session_id == other.session_id
    }
}

/// Receiving half of a client's outbox, drained only by its write loop.
///
/// Once the client is deregistered the sending half is dropped: remaining
/// messages are still delivered, then [`Outbox::recv`] returns `None`.
#[derive(Debug)]
pub struct Outbox {
    receiver: mpsc::Receiver<Message>,
}

impl Outbox {
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Non-blocking receive, mostly useful for inspecting an outbox in tests.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.receiver.try_recv().ok()
    }

    /// Number of messages waiting to be written.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Whether the sending half has been dropped (the client was deregistered).
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

/// Entry in the manager's client table.
#[derive(Debug)]
pub(crate) struct ClientRecord {
    pub(crate) handle: ClientHandle,
    pub(crate) outbox: mpsc::Sender<Message>,
    pub(crate) rooms: HashSet<RoomName>,
}

impl ClientRecord {
    /// Create the record together with the receiving half of its outbox.
    pub(crate) fn new(handle: ClientHandle, capacity: usize) -> (Self, Outbox) {
        let (sender, receiver) = mpsc::channel(capacity);
        let record = Self {
            handle,
            outbox: sender,
            rooms: HashSet::new(),
        };
        (record, Outbox { receiver })
    }

    pub(crate) fn snapshot(&self) -> ClientSnapshot {
        let mut rooms: Vec<RoomName> = self.rooms.iter().cloned().collect();
        rooms.sort();
        ClientSnapshot {
            id: self.handle.id.clone(),
            connected_at: self.handle.connected_at,
            last_seen: self.handle.last_seen(),
            rooms,
        }
    }
}

/// Point-in-time view of a registered client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSnapshot {
    pub id: ClientId,
    pub connected_at: Timestamp,
    pub last_seen: Timestamp,
    /// Sorted by name.
    pub rooms: Vec<RoomName>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> ClientHandle {
        ClientHandle::new(ClientId::new("alice".to_string()).unwrap(), Timestamp::new(1000))
    }

    #[test]
    fn test_touch_never_moves_last_seen_backwards() {
        // テスト項目: last_seen は古い時刻で上書きされない
        // given (前提条件):
        let handle = handle();
        handle.touch(Timestamp::new(5000));

        // when (操作):
        handle.touch(Timestamp::new(3000));

        // then (期待する結果):
        assert_eq!(handle.last_seen(), Timestamp::new(5000));
        assert_eq!(handle.connected_at(), Timestamp::new(1000));
    }

    #[test]
    fn test_handles_for_same_identity_are_distinct_sessions() {
        // テスト項目: 同じ ID でも別の接続なら別セッションとして扱われる
        // given (前提条件):
        let first = handle();
        let second = handle();

        // when (操作):
        let same = first.is_same_session(&first.clone());
        let different = first.is_same_session(&second);

        // then (期待する結果):
        assert!(same);
        assert!(!different);
    }

    #[tokio::test]
    async fn test_outbox_closes_after_record_is_dropped() {
        // テスト項目: レコードが破棄されると残りを配信した後に outbox が閉じる
        // given (前提条件):
        let (record, mut outbox) = ClientRecord::new(handle(), 4);
        let message = Message::private(
            ClientId::new("bob".to_string()).unwrap(),
            ClientId::new("alice".to_string()).unwrap(),
            "hi",
        );
        record.outbox.try_send(message.clone()).unwrap();

        // when (操作):
        drop(record);

        // then (期待する結果):
        assert_eq!(outbox.recv().await, Some(message));
        assert_eq!(outbox.recv().await, None);
        assert!(outbox.is_closed());
    }
}
