//! InMemory MessageStore 実装
//!
//! ドメイン層が定義する `MessageStore` trait の具体的な実装。
//! Vec / HashSet をインメモリ DB として使用します。
//!
//! 保存したメッセージにはストア側で UUID を採番します。既読マークは
//! `(user_id, message_id)` の組で記録し、メッセージの存在は確認しません。

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tsunagi_shared::time::{Clock, SystemClock};
use uuid::Uuid;

use crate::domain::{ClientId, Message, MessageId, MessageStore, StoreError, Timestamp};

/// A message as recorded by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: MessageId,
    pub message: Message,
    pub saved_at: Timestamp,
}

#[derive(Debug, Default)]
struct StoreState {
    messages: Vec<StoredMessage>,
    read_marks: HashSet<(ClientId, MessageId)>,
}

/// インメモリ MessageStore 実装
pub struct InMemoryMessageStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
        }
    }

    /// All saved messages in save order.
    pub async fn messages(&self) -> Vec<StoredMessage> {
        self.state.lock().await.messages.clone()
    }

    pub async fn is_read(&self, user_id: &ClientId, message_id: &MessageId) -> bool {
        self.state
            .lock()
            .await
            .read_marks
            .contains(&(user_id.clone(), message_id.clone()))
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn save(&self, message: &Message) -> Result<(), StoreError> {
        let id = MessageId::new(Uuid::new_v4().to_string())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let stored = StoredMessage {
            id: id.clone(),
            message: message.clone(),
            saved_at: Timestamp::new(self.clock.now_millis()),
        };

        self.state.lock().await.messages.push(stored);
        tracing::debug!("Saved {} message '{}'", message.kind(), id);
        Ok(())
    }

    async fn mark_as_read(&self, user_id: &ClientId, message_id: &MessageId) -> Result<(), StoreError> {
        self.state
            .lock()
            .await
            .read_marks
            .insert((user_id.clone(), message_id.clone()));
        tracing::debug!("Message '{}' marked as read by '{}'", message_id, user_id);
        Ok(())
    }
}
