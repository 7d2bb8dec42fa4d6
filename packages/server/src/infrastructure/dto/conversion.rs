//! Conversion logic between DTOs and domain values, and the JSON wire codec.

use tsunagi_shared::time::timestamp_to_jst_rfc3339;

use crate::{
    domain::{ClientId, Message, MessageCodec, MessageParts, ValidationError},
    infrastructure::dto::{
        http::{ClientDetailDto, RoomSummaryDto},
        websocket::MessageDto,
    },
    router::{ClientSnapshot, RoomSnapshot},
};

// ========================================
// DTO → Domain
// ========================================

impl From<MessageDto> for MessageParts {
    fn from(dto: MessageDto) -> Self {
        Self {
            kind: dto.r#type,
            content: dto.content,
            sender_id: dto.sender_id,
            receiver_id: dto.receiver_id,
            room: dto.room.or(dto.group_id),
            message_id: dto.message_id,
            url: dto.url,
            file_type: dto.file_type,
        }
    }
}

impl TryFrom<MessageDto> for Message {
    type Error = ValidationError;

    fn try_from(dto: MessageDto) -> Result<Self, Self::Error> {
        Message::try_from(MessageParts::from(dto))
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        let attachment = message.attachment();
        Self {
            r#type: message.kind().as_wire_str().to_string(),
            content: message.content().to_string(),
            sender_id: message.sender_id().as_str().to_string(),
            receiver_id: message.receiver_id().map(|id| id.as_str().to_string()),
            room: message.room().map(|room| room.as_str().to_string()),
            group_id: None,
            message_id: message.message_id().map(|id| id.as_str().to_string()),
            url: attachment.map(|a| a.url.clone()),
            file_type: attachment.and_then(|a| a.file_type.clone()),
        }
    }
}

impl From<ClientSnapshot> for ClientDetailDto {
    fn from(snapshot: ClientSnapshot) -> Self {
        Self {
            client_id: snapshot.id.into_string(),
            connected_at: timestamp_to_jst_rfc3339(snapshot.connected_at.value()),
            last_seen: timestamp_to_jst_rfc3339(snapshot.last_seen.value()),
            rooms: snapshot.rooms.into_iter().map(|r| r.into_string()).collect(),
        }
    }
}

impl From<RoomSnapshot> for RoomSummaryDto {
    fn from(snapshot: RoomSnapshot) -> Self {
        Self {
            name: snapshot.name.into_string(),
            members: snapshot
                .members
                .into_iter()
                .map(|id| id.into_string())
                .collect(),
        }
    }
}

// ========================================
// Wire codec
// ========================================

/// JSON implementation of [`MessageCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMessageCodec;

impl MessageCodec for JsonMessageCodec {
    fn decode(&self, payload: &str, connection_id: &ClientId) -> Result<Message, ValidationError> {
        let mut dto: MessageDto =
            serde_json::from_str(payload).map_err(|e| ValidationError::Malformed(e.to_string()))?;

        // sender_id を省略したクライアントは接続の ID で送信したものとみなす
        if dto.sender_id.trim().is_empty() {
            dto.sender_id = connection_id.as_str().to_string();
        }

        Message::try_from(dto)
    }

    fn encode(&self, message: &Message) -> Result<String, ValidationError> {
        serde_json::to_string(&MessageDto::from(message))
            .map_err(|e| ValidationError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Attachment, MessageKind, RoomName, Timestamp};

    fn id(value: &str) -> ClientId {
        ClientId::new(value.to_string()).unwrap()
    }

    #[test]
    fn test_decode_group_message() {
        // テスト項目: group メッセージの JSON がドメインの Message に変換される
        // given (前提条件):
        let codec = JsonMessageCodec;
        let payload = r#"{"type":"group","content":"hello","sender_id":"alice","room":"general"}"#;

        // when (操作):
        let message = codec.decode(payload, &id("alice")).unwrap();

        // then (期待する結果):
        assert_eq!(message.kind(), MessageKind::Group);
        assert_eq!(message.content(), "hello");
        assert_eq!(
            message.room(),
            Some(&RoomName::new("general".to_string()).unwrap())
        );
    }

    #[test]
    fn test_decode_prefers_room_over_group_id() {
        // テスト項目: group_id だけなら room として扱い、両方あれば room を優先する
        // given (前提条件):
        let codec = JsonMessageCodec;
        let legacy = r#"{"type":"group","content":"hi","group_id":"legacy"}"#;
        let both = r#"{"type":"group","content":"hi","room":"general","group_id":"legacy"}"#;

        // when (操作):
        let legacy = codec.decode(legacy, &id("alice")).unwrap();
        let both = codec.decode(both, &id("alice")).unwrap();

        // then (期待する結果):
        assert_eq!(legacy.room(), Some(&RoomName::new("legacy".to_string()).unwrap()));
        assert_eq!(both.room(), Some(&RoomName::new("general".to_string()).unwrap()));
    }

    #[test]
    fn test_decode_stamps_connection_identity_when_sender_missing() {
        // テスト項目: sender_id が空のとき接続の ID が送信者になる
        // given (前提条件):
        let codec = JsonMessageCodec;
        let payload = r#"{"type":"private","content":"hi","receiver_id":"bob"}"#;

        // when (操作):
        let message = codec.decode(payload, &id("alice")).unwrap();

        // then (期待する結果):
        assert_eq!(message.sender_id(), &id("alice"));
        assert_eq!(message.receiver_id(), Some(&id("bob")));
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        // テスト項目: JSON として不正なペイロードは Malformed になる
        // given (前提条件):
        let codec = JsonMessageCodec;

        // when (操作):
        let result = codec.decode("{not json", &id("alice"));

        // then (期待する結果):
        assert!(matches!(result, Err(ValidationError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        // テスト項目: 未知の type は UnknownKind になる
        // given (前提条件):
        let codec = JsonMessageCodec;
        let payload = r#"{"type":"shout","content":"HI","sender_id":"alice"}"#;

        // when (操作):
        let result = codec.decode(payload, &id("alice"));

        // then (期待する結果):
        assert_eq!(result, Err(ValidationError::UnknownKind("shout".to_string())));
    }

    #[test]
    fn test_encode_includes_attachment() {
        // テスト項目: 添付ファイル付きメッセージは url / file_type を含めてエンコードされる
        // given (前提条件):
        let codec = JsonMessageCodec;
        let message = Message::private(id("alice"), id("bob"), "see file").with_attachment(
            Attachment {
                url: "https://example.com/a.png".to_string(),
                file_type: Some("image/png".to_string()),
            },
        );

        // when (操作):
        let json = codec.encode(&message).unwrap();

        // then (期待する結果):
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "private",
                "content": "see file",
                "sender_id": "alice",
                "receiver_id": "bob",
                "url": "https://example.com/a.png",
                "file_type": "image/png"
            })
        );
    }

    #[test]
    fn test_client_snapshot_to_dto() {
        // テスト項目: ClientSnapshot が RFC 3339 の時刻を持つ DTO に変換される
        // given (前提条件):
        let snapshot = ClientSnapshot {
            id: id("alice"),
            connected_at: Timestamp::new(0),
            last_seen: Timestamp::new(1_000),
            rooms: vec![RoomName::new("general".to_string()).unwrap()],
        };

        // when (操作):
        let dto = ClientDetailDto::from(snapshot);

        // then (期待する結果):
        assert_eq!(dto.client_id, "alice");
        assert_eq!(dto.connected_at, Some("1970-01-01T09:00:00+09:00".to_string()));
        assert_eq!(dto.last_seen, Some("1970-01-01T09:00:01+09:00".to_string()));
        assert_eq!(dto.rooms, vec!["general".to_string()]);
    }
}
