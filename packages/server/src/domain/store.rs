//! Persistence collaborator interface.
//!
//! The router never waits on the store: calls are spawned and failures only
//! logged (see `MessageRouter`).

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::{
    error::StoreError,
    message::Message,
    value_object::{ClientId, MessageId},
};

/// Message store trait
///
/// Infrastructure 層が具体的な実装を提供します（依存性の逆転）。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// メッセージを保存
    async fn save(&self, message: &Message) -> Result<(), StoreError>;

    /// `user_id` が `message_id` を既読にしたことを記録
    async fn mark_as_read(&self, user_id: &ClientId, message_id: &MessageId)
    -> Result<(), StoreError>;
}
