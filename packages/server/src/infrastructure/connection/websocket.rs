//! axum WebSocket adapter.
//!
//! The upgraded socket is split so the read loop and the write loop each own
//! one half. Ping replies are queued by the WebSocket implementation itself;
//! the router only observes the frames.

use async_trait::async_trait;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};

use crate::domain::{Frame, FrameReader, FrameWriter, TransportError};

pub struct WebSocketReader(SplitStream<WebSocket>);

pub struct WebSocketWriter(SplitSink<WebSocket, WsMessage>);

/// Split an upgraded socket into router-facing halves.
pub fn split(socket: WebSocket) -> (WebSocketReader, WebSocketWriter) {
    let (sink, stream) = socket.split();
    (WebSocketReader(stream), WebSocketWriter(sink))
}

fn into_frame(message: WsMessage) -> Frame {
    match message {
        WsMessage::Text(text) => Frame::Text(text.as_str().to_owned()),
        WsMessage::Binary(bytes) => Frame::Binary(bytes.to_vec()),
        WsMessage::Ping(payload) => Frame::Ping(payload.to_vec()),
        WsMessage::Pong(payload) => Frame::Pong(payload.to_vec()),
        WsMessage::Close(_) => Frame::Close,
    }
}

fn from_frame(frame: Frame) -> WsMessage {
    match frame {
        Frame::Text(text) => WsMessage::Text(text.into()),
        Frame::Binary(bytes) => WsMessage::Binary(bytes.into()),
        Frame::Ping(payload) => WsMessage::Ping(payload.into()),
        Frame::Pong(payload) => WsMessage::Pong(payload.into()),
        Frame::Close => WsMessage::Close(None),
    }
}

#[async_trait]
impl FrameReader for WebSocketReader {
    async fn next_frame(&mut self) -> Result<Option<Frame>, TransportError> {
        match self.0.next().await {
            Some(Ok(message)) => Ok(Some(into_frame(message))),
            Some(Err(e)) => Err(TransportError::Receive(e.to_string())),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl FrameWriter for WebSocketWriter {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError> {
        self.0
            .send(from_frame(frame))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        // Sink::close は close フレームを送ってからフラッシュする
        self.0
            .close()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_conversion_preserves_kind() {
        // テスト項目: WebSocket メッセージとフレームが種類を保ったまま変換される
        // given (前提条件):
        let text = WsMessage::Text("hello".into());
        let ping = WsMessage::Ping(vec![1, 2].into());

        // when (操作):
        let text_frame = into_frame(text);
        let ping_frame = into_frame(ping);
        let close = from_frame(Frame::Close);

        // then (期待する結果):
        assert_eq!(text_frame, Frame::Text("hello".to_string()));
        assert_eq!(ping_frame, Frame::Ping(vec![1, 2]));
        assert!(matches!(close, WsMessage::Close(None)));
    }

    #[test]
    fn test_binary_frame_keeps_raw_bytes() {
        // テスト項目: バイナリフレームは置換されずにそのままのバイト列で渡される
        // given (前提条件):
        let bytes = b"{\"type\":\"private\",\"receiver_id\":\"B\",\"content\":\"a\xFFb\"}".to_vec();
        let binary = WsMessage::Binary(bytes.clone().into());

        // when (操作):
        let frame = into_frame(binary);

        // then (期待する結果):
        assert_eq!(frame, Frame::Binary(bytes));
    }
}
