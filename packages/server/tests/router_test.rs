//! Router properties exercised through the public API over in-process connections.

use std::{sync::Arc, time::Duration};

use tsunagi_server::{
    domain::{ClientId, Frame, Message, RoomName},
    infrastructure::{
        connection::{PeerEndpoint, channel_connection},
        dto::conversion::JsonMessageCodec,
        store::InMemoryMessageStore,
    },
    router::{Connection, DispatchOutcome, MessageRouter, RouterConfig},
};

fn id(value: &str) -> ClientId {
    ClientId::new(value.to_string()).unwrap()
}

fn room(value: &str) -> RoomName {
    RoomName::new(value.to_string()).unwrap()
}

fn router() -> MessageRouter {
    MessageRouter::new(RouterConfig::default(), Arc::new(JsonMessageCodec))
}

async fn connect(router: &MessageRouter, client_id: &str) -> (Connection, PeerEndpoint) {
    let (reader, writer, peer) = channel_connection();
    let connection = router.connect(id(client_id), reader, writer).await;
    (connection, peer)
}

async fn next_json(peer: &mut PeerEndpoint) -> serde_json::Value {
    let payload = tokio::time::timeout(Duration::from_secs(2), peer.recv_text())
        .await
        .expect("timed out waiting for a message")
        .expect("connection closed");
    serde_json::from_str(&payload).unwrap()
}

#[tokio::test]
async fn test_private_message_reaches_only_receiver() {
    // テスト項目: A → B の private メッセージは B にだけ 1 回届く
    // given (前提条件):
    let router = router();
    let (_a, peer_a) = connect(&router, "A").await;
    let (_b, mut peer_b) = connect(&router, "B").await;
    let (_c, mut peer_c) = connect(&router, "C").await;

    // when (操作):
    peer_a
        .send_text(r#"{"type":"private","content":"hi","sender_id":"A","receiver_id":"B"}"#)
        .unwrap();

    // then (期待する結果):
    let value = next_json(&mut peer_b).await;
    assert_eq!(value["content"], "hi");
    assert_eq!(value["sender_id"], "A");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(peer_b.try_recv().is_none());
    assert!(peer_c.try_recv().is_none());
}

#[tokio::test]
async fn test_group_message_fans_out_to_members() {
    // テスト項目: group メッセージは送信者を含むルームの全メンバーに届く
    // given (前提条件):
    let router = router();
    let (_a, mut peer_a) = connect(&router, "A").await;
    let (_b, mut peer_b) = connect(&router, "B").await;
    let (_c, mut peer_c) = connect(&router, "C").await;
    let (_d, mut peer_d) = connect(&router, "D").await;
    for member in ["A", "B", "C"] {
        assert!(router.join_room(&id(member), room("r1")).await);
    }

    // when (操作):
    peer_a
        .send_text(r#"{"type":"group","content":"hello room","group_id":"r1"}"#)
        .unwrap();

    // then (期待する結果):
    for peer in [&mut peer_a, &mut peer_b, &mut peer_c] {
        let value = next_json(peer).await;
        assert_eq!(value["type"], "group");
        assert_eq!(value["room"], "r1");
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(peer_d.try_recv().is_none());
}

#[tokio::test]
async fn test_closed_client_is_removed_everywhere() {
    // テスト項目: close_client 後はクライアントもルームも残らず、配信もされない
    // given (前提条件):
    let router = router();
    let (a, mut peer_a) = connect(&router, "A").await;
    router.join_room(&id("A"), room("solo")).await;

    // when (操作):
    assert!(router.close_client(&id("A")).await);
    a.closed().await;

    // then (期待する結果):
    assert_eq!(peer_a.recv().await, Some(Frame::Close));
    assert!(router.manager().get_client(&id("A")).await.is_none());
    assert!(router.manager().room_members(&room("solo")).await.is_none());
    let outcome = router.dispatch(Message::private(id("B"), id("A"), "late")).await;
    assert_eq!(outcome, DispatchOutcome::RecipientOffline(id("A")));
}

#[tokio::test]
async fn test_broadcast_all_reaches_every_session() {
    // テスト項目: broadcast_all は全セッションに届く
    // given (前提条件):
    let router = router();
    let (_a, mut peer_a) = connect(&router, "A").await;
    let (_b, mut peer_b) = connect(&router, "B").await;

    // when (操作):
    let outcome = router
        .broadcast_all(Message::group(id("system"), room("all"), "maintenance"))
        .await;

    // then (期待する結果):
    assert_eq!(outcome.recipients(), 2);
    assert_eq!(next_json(&mut peer_a).await["content"], "maintenance");
    assert_eq!(next_json(&mut peer_b).await["content"], "maintenance");
}

#[tokio::test]
async fn test_slow_client_is_evicted_without_affecting_others() {
    // テスト項目: outbox を読まないクライアントは満杯時に切断され、他のクライアントには届き続ける
    // given (前提条件):
    let config = RouterConfig::new(
        Duration::from_secs(30),
        Duration::from_secs(40),
        Duration::from_secs(10),
        4,
    )
    .unwrap();
    let router = MessageRouter::new(config, Arc::new(JsonMessageCodec));
    // slow はセッションを持たないので outbox が消費されない
    let (slow, _slow_outbox) = router.manager().register(id("slow")).await;
    let (_fast, mut peer_fast) = connect(&router, "fast").await;
    router.join_room(&id("slow"), room("r1")).await;
    router.join_room(&id("fast"), room("r1")).await;

    for n in 0..4 {
        router
            .dispatch(Message::private(id("fast"), id("slow"), format!("queued {n}")))
            .await;
    }

    // when (操作):
    let outcome = router
        .dispatch(Message::group(id("fast"), room("r1"), "overflow"))
        .await;

    // then (期待する結果):
    assert_eq!(
        outcome,
        DispatchOutcome::Delivered {
            recipients: 1,
            evicted: vec![id("slow")]
        }
    );
    assert!(slow.is_terminated());
    assert_eq!(router.manager().room_members(&room("r1")).await, Some(vec![id("fast")]));
    assert_eq!(next_json(&mut peer_fast).await["content"], "overflow");
}

#[tokio::test]
async fn test_persisted_messages_and_read_receipts() {
    // テスト項目: ストア設定時はメッセージが保存され、既読通知が記録される
    // given (前提条件):
    let store = Arc::new(InMemoryMessageStore::new());
    let router = router().with_store(store.clone());
    let (_a, peer_a) = connect(&router, "A").await;
    let (_b, mut peer_b) = connect(&router, "B").await;

    // when (操作):
    peer_a
        .send_text(r#"{"type":"notification","content":"ping","receiver_id":"B"}"#)
        .unwrap();
    next_json(&mut peer_b).await;
    peer_b
        .send_text(r#"{"type":"mark_as_read","message_id":"m-42"}"#)
        .unwrap();

    // then (期待する結果):
    let message_id = tsunagi_server::domain::MessageId::new("m-42".to_string()).unwrap();
    let mut attempts = 0;
    while !store.is_read(&id("B"), &message_id).await || store.messages().await.is_empty() {
        attempts += 1;
        assert!(attempts < 100, "read receipt was not recorded");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let messages = store.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message.content(), "ping");
}
