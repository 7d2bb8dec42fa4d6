//! Data Transfer Objects (DTOs)
//!
//! 外部とのデータ交換用の型定義（WebSocket のワイヤー形式、HTTP レスポンス）。
//! ドメインモデルとの変換は `conversion` に置く。

pub mod conversion;
pub mod http;
pub mod websocket;
