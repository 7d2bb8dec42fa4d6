//! Domain error types.

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// 空文字列
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// 最大長の超過
    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Inbound message rejected at the boundary; the connection stays open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The frame could not be decoded at all.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// `type` is outside the closed set of message kinds.
    #[error("unknown message kind '{0}'")]
    UnknownKind(String),

    /// A field required by the message kind is missing or empty.
    #[error("{kind} message requires '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// A field is present but not a valid value object.
    #[error("invalid field: {0}")]
    InvalidField(#[from] ValueObjectError),
}

/// Read, write or upgrade failure. Always terminates the affected connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("receive failed: {0}")]
    Receive(String),

    #[error("send failed: {0}")]
    Send(String),

    /// The peer did not accept a frame within the write deadline.
    #[error("write deadline exceeded")]
    WriteTimeout,
}

/// Persistence failure. Logged, never propagated to dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("message store unavailable: {0}")]
    Unavailable(String),
}
