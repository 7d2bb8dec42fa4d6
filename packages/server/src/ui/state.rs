//! Shared application state.

use crate::router::MessageRouter;

/// Shared application state
pub struct AppState {
    /// MessageRouter（接続管理・ルーティングの入口）
    pub router: MessageRouter,
}
