//! Connection adapter interface.
//!
//! The transport upgrade happens outside the router; what reaches it is an
//! already-upgraded duplex stream split into a read half and a write half so
//! the read loop and the write loop can run independently. Deadlines are
//! applied by the caller (see `router::heartbeat`).

use async_trait::async_trait;

use super::error::TransportError;

/// One frame on the duplex stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Encoded message payload.
    Text(String),
    /// Payload sent as a binary frame. Must be UTF-8 to be decoded.
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

/// Read half of a connection.
#[async_trait]
pub trait FrameReader: Send + 'static {
    /// Wait for the next frame. `Ok(None)` means the peer closed the stream.
    async fn next_frame(&mut self) -> Result<Option<Frame>, TransportError>;
}

/// Write half of a connection. Single writer.
#[async_trait]
pub trait FrameWriter: Send + 'static {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Flush and close the underlying stream.
    async fn close(&mut self) -> Result<(), TransportError>;
}
