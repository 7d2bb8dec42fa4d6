//! Message model and boundary validation.
//!
//! A [`Message`] is immutable once constructed and always carries the fields its
//! kind requires: the routing target is part of the type, so a `group` message
//! without a room cannot exist past validation.

use std::fmt;

use super::{
    error::ValidationError,
    value_object::{ClientId, MessageId, RoomName},
};

/// Closed set of message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Private,
    Group,
    Notification,
    ReadReceipt,
}

impl MessageKind {
    /// Wire name used in the `type` field.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Group => "group",
            Self::Notification => "notification",
            Self::ReadReceipt => "mark_as_read",
        }
    }

    /// Parse the wire name. Unknown kinds are rejected, not dropped.
    pub fn from_wire(value: &str) -> Result<Self, ValidationError> {
        match value {
            "private" => Ok(Self::Private),
            "group" => Ok(Self::Group),
            "notification" => Ok(Self::Notification),
            "mark_as_read" => Ok(Self::ReadReceipt),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

/// File or media reference attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    pub file_type: Option<String>,
}

/// Where a message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Client(ClientId),
    Room(RoomName),
    ReadReceipt(MessageId),
}

/// 検証済みのメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageKind,
    sender_id: ClientId,
    content: String,
    route: Route,
    attachment: Option<Attachment>,
}

impl Message {
    /// 1 対 1 のメッセージ
    pub fn private(sender_id: ClientId, receiver_id: ClientId, content: impl Into<String>) -> Self {
        Self::new(MessageKind::Private, sender_id, Route::Client(receiver_id), content)
    }

    /// 特定ユーザーへの通知
    pub fn notification(
        sender_id: ClientId,
        receiver_id: ClientId,
        content: impl Into<String>,
    ) -> Self {
        Self::new(
            MessageKind::Notification,
            sender_id,
            Route::Client(receiver_id),
            content,
        )
    }

    /// ルーム宛てのメッセージ
    pub fn group(sender_id: ClientId, room: RoomName, content: impl Into<String>) -> Self {
        Self::new(MessageKind::Group, sender_id, Route::Room(room), content)
    }

    /// 既読通知（ルーティングされず、ストアに既読を記録するだけ）
    pub fn read_receipt(sender_id: ClientId, message_id: MessageId) -> Self {
        Self::new(
            MessageKind::ReadReceipt,
            sender_id,
            Route::ReadReceipt(message_id),
            String::new(),
        )
    }

    fn new(kind: MessageKind, sender_id: ClientId, route: Route, content: impl Into<String>) -> Self {
        Self {
            kind,
            sender_id,
            content: content.into(),
            route,
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn sender_id(&self) -> &ClientId {
        &self.sender_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Recipient of a `private` or `notification` message.
    pub fn receiver_id(&self) -> Option<&ClientId> {
        match &self.route {
            Route::Client(id) => Some(id),
            _ => None,
        }
    }

    /// Target room of a `group` message.
    pub fn room(&self) -> Option<&RoomName> {
        match &self.route {
            Route::Room(room) => Some(room),
            _ => None,
        }
    }

    /// Message referenced by a read receipt.
    pub fn message_id(&self) -> Option<&MessageId> {
        match &self.route {
            Route::ReadReceipt(id) => Some(id),
            _ => None,
        }
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }
}

/// 未検証のメッセージ（デコード直後の生の値）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageParts {
    pub kind: String,
    pub content: String,
    pub sender_id: String,
    pub receiver_id: Option<String>,
    pub room: Option<String>,
    pub message_id: Option<String>,
    pub url: Option<String>,
    pub file_type: Option<String>,
}

/// Treat absent and blank values alike.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(
    value: Option<String>,
    kind: MessageKind,
    field: &'static str,
) -> Result<String, ValidationError> {
    non_blank(value).ok_or(ValidationError::MissingField {
        kind: kind.as_wire_str(),
        field,
    })
}

impl TryFrom<MessageParts> for Message {
    type Error = ValidationError;

    fn try_from(parts: MessageParts) -> Result<Self, Self::Error> {
        let kind = MessageKind::from_wire(&parts.kind)?;
        let sender_id = ClientId::new(required(Some(parts.sender_id), kind, "sender_id")?)?;

        let message = match kind {
            MessageKind::Private | MessageKind::Notification => {
                let receiver_id =
                    ClientId::new(required(parts.receiver_id, kind, "receiver_id")?)?;
                Self::new(kind, sender_id, Route::Client(receiver_id), parts.content)
            }
            MessageKind::Group => {
                let room = RoomName::new(required(parts.room, kind, "room")?)?;
                Self::group(sender_id, room, parts.content)
            }
            MessageKind::ReadReceipt => {
                let message_id = MessageId::new(required(parts.message_id, kind, "message_id")?)?;
                Self::read_receipt(sender_id, message_id)
            }
        };

        Ok(match non_blank(parts.url) {
            Some(url) => message.with_attachment(Attachment {
                url,
                file_type: non_blank(parts.file_type),
            }),
            None => message,
        })
    }
}
