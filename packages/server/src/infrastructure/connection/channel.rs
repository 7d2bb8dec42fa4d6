//! In-process connection over unbounded mpsc channels.
//!
//! Used by tests and by embedders that route messages between components of
//! the same process. The router side gets a [`ChannelReader`] /
//! [`ChannelWriter`] pair; the other side drives a [`PeerEndpoint`].

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{Frame, FrameReader, FrameWriter, TransportError};

pub struct ChannelReader {
    inbound: mpsc::UnboundedReceiver<Frame>,
}

pub struct ChannelWriter {
    outbound: Option<mpsc::UnboundedSender<Frame>>,
}

/// The remote end of an in-process connection.
pub struct PeerEndpoint {
    to_router: Option<mpsc::UnboundedSender<Frame>>,
    from_router: mpsc::UnboundedReceiver<Frame>,
}

/// Create a connected reader/writer pair and the peer that talks to it.
pub fn channel_connection() -> (ChannelReader, ChannelWriter, PeerEndpoint) {
    let (to_router, inbound) = mpsc::unbounded_channel();
    let (outbound, from_router) = mpsc::unbounded_channel();
    (
        ChannelReader { inbound },
        ChannelWriter {
            outbound: Some(outbound),
        },
        PeerEndpoint {
            to_router: Some(to_router),
            from_router,
        },
    )
}

#[async_trait]
impl FrameReader for ChannelReader {
    async fn next_frame(&mut self) -> Result<Option<Frame>, TransportError> {
        Ok(self.inbound.recv().await)
    }
}

#[async_trait]
impl FrameWriter for ChannelWriter {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError> {
        let outbound = self
            .outbound
            .as_ref()
            .ok_or_else(|| TransportError::Send("connection closed".to_string()))?;
        outbound
            .send(frame)
            .map_err(|_| TransportError::Send("peer disconnected".to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(outbound) = self.outbound.take() {
            // 相手が既にいなくても close は成功扱い
            let _ = outbound.send(Frame::Close);
        }
        Ok(())
    }
}

impl PeerEndpoint {
    pub fn send(&self, frame: Frame) -> Result<(), TransportError> {
        let to_router = self
            .to_router
            .as_ref()
            .ok_or_else(|| TransportError::Send("peer already disconnected".to_string()))?;
        to_router
            .send(frame)
            .map_err(|_| TransportError::Send("router side closed".to_string()))
    }

    pub fn send_text(&self, payload: impl Into<String>) -> Result<(), TransportError> {
        self.send(Frame::Text(payload.into()))
    }

    /// Next frame written by the router. `None` once the router side is gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.from_router.recv().await
    }

    /// Next text payload, answering pings along the way.
    ///
    /// Returns `None` on a close frame or when the router side is gone.
    pub async fn recv_text(&mut self) -> Option<String> {
        loop {
            match self.from_router.recv().await? {
                Frame::Text(payload) => return Some(payload),
                Frame::Ping(payload) => {
                    let _ = self.send(Frame::Pong(payload));
                }
                Frame::Pong(_) | Frame::Binary(_) => {}
                Frame::Close => return None,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<Frame> {
        self.from_router.try_recv().ok()
    }

    /// Stop sending; the router's reader sees end-of-stream.
    pub fn disconnect(&mut self) {
        self.to_router = None;
    }
}
