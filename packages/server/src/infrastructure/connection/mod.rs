//! Connection adapters: concrete `FrameReader` / `FrameWriter` pairs.
//!
//! - `websocket`: axum の WebSocket（本番用）
//! - `channel`: プロセス内の mpsc チャネル（テスト・組み込み用）

pub mod channel;
pub mod websocket;

pub use channel::{ChannelReader, ChannelWriter, PeerEndpoint, channel_connection};
pub use websocket::{WebSocketReader, WebSocketWriter, split};
