//! Room: a named set of member clients.
//!
//! Members are held by identifier, never by reference; the client records
//! themselves live in the manager's client table. All mutation happens under
//! the manager's critical section.

use std::collections::HashSet;

use super::value_object::{ClientId, RoomName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    name: RoomName,
    members: HashSet<ClientId>,
}

impl Room {
    /// 空のルームを作成
    pub fn new(name: RoomName) -> Self {
        Self {
            name,
            members: HashSet::new(),
        }
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    /// メンバーを追加。既に参加済みなら `false`
    pub fn add(&mut self, client_id: ClientId) -> bool {
        self.members.insert(client_id)
    }

    /// メンバーを削除。参加していなければ `false`
    pub fn remove(&mut self, client_id: &ClientId) -> bool {
        self.members.remove(client_id)
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.members.contains(client_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Snapshot of the current members, in no particular order.
    pub fn members(&self) -> Vec<ClientId> {
        self.members.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: &str) -> ClientId {
        ClientId::new(id.to_string()).unwrap()
    }

    fn room() -> Room {
        Room::new(RoomName::new("r1".to_string()).unwrap())
    }

    #[test]
    fn test_add_is_idempotent() {
        // テスト項目: 同じクライアントを 2 回追加してもメンバーは 1 人
        // given (前提条件):
        let mut room = room();

        // when (操作):
        let first = room.add(client("alice"));
        let second = room.add(client("alice"));

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(room.len(), 1);
    }

    #[test]
    fn test_remove_last_member_leaves_room_empty() {
        // テスト項目: 最後のメンバーを削除するとルームは空になる
        // given (前提条件):
        let mut room = room();
        room.add(client("alice"));

        // when (操作):
        let removed = room.remove(&client("alice"));

        // then (期待する結果):
        assert!(removed);
        assert!(room.is_empty());
    }

    #[test]
    fn test_remove_non_member_is_noop() {
        // テスト項目: 参加していないクライアントの削除は何もしない
        // given (前提条件):
        let mut room = room();
        room.add(client("alice"));

        // when (操作):
        let removed = room.remove(&client("bob"));

        // then (期待する結果):
        assert!(!removed);
        assert_eq!(room.len(), 1);
    }

    #[test]
    fn test_members_snapshot() {
        // テスト項目: members() は現在のメンバーのスナップショットを返す
        // given (前提条件):
        let mut room = room();
        room.add(client("alice"));
        room.add(client("bob"));

        // when (操作):
        let members = room.members();
        room.remove(&client("alice"));

        // then (期待する結果):
        assert_eq!(members.len(), 2);
        assert!(members.contains(&client("alice")));
        assert!(members.contains(&client("bob")));
        assert!(!room.contains(&client("alice")));
    }
}
