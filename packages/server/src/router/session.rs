//! Per-client read and write loops.
//!
//! ## 処理フロー
//!
//! 1. read loop: フレームを受信 → lastSeen 更新 → デコード → MessageRouter に渡す
//! 2. write loop: outbox のメッセージ or ping タイマーを待ち、期限付きで書き込む
//! 3. どちらかのループが終了したら deregister する（冪等なので両方から呼ぶ）
//!
//! deregister によって outbox の送信側が破棄されるため、write loop は
//! 残りのメッセージを書き切ってから close フレームを送って終了する。
//! read loop は ClientHandle の terminate シグナルで停止する。

use crate::domain::{Frame, FrameReader, FrameWriter, ValidationError};

use super::{
    MessageRouter,
    client::{ClientHandle, Outbox},
    heartbeat::{self, ReadOutcome},
};

/// One registered connection: its handle, outbox, and the two halves of the stream.
pub(crate) struct ClientSession<R, W> {
    router: MessageRouter,
    handle: ClientHandle,
    outbox: Outbox,
    reader: R,
    writer: W,
}

impl<R, W> ClientSession<R, W>
where
    R: FrameReader,
    W: FrameWriter,
{
    pub(crate) fn new(
        router: MessageRouter,
        handle: ClientHandle,
        outbox: Outbox,
        reader: R,
        writer: W,
    ) -> Self {
        Self {
            router,
            handle,
            outbox,
            reader,
            writer,
        }
    }

    /// Run both loops until the client is destroyed.
    pub(crate) async fn run(self) {
        let Self {
            router,
            handle,
            outbox,
            reader,
            writer,
        } = self;

        let mut write_task = tokio::spawn(write_loop(router.clone(), handle.clone(), outbox, writer));
        let mut read_task = tokio::spawn(read_loop(router.clone(), handle.clone(), reader));

        // 片方が終了したら deregister し、もう片方の終了を待つ
        let (first, second) = tokio::select! {
            result = &mut read_task => {
                router.manager().deregister(&handle).await;
                (result, write_task.await)
            }
            result = &mut write_task => {
                router.manager().deregister(&handle).await;
                (result, read_task.await)
            }
        };
        for result in [first, second] {
            if let Err(e) = result {
                tracing::error!("Loop for client '{}' failed: {}", handle.id(), e);
            }
        }

        tracing::debug!("Session for client '{}' finished", handle.id());
    }
}

async fn read_loop<R>(router: MessageRouter, handle: ClientHandle, mut reader: R)
where
    R: FrameReader,
{
    let pong_wait = router.config().pong_wait();

    loop {
        let outcome = tokio::select! {
            _ = handle.terminated() => break,
            outcome = heartbeat::read_frame(&mut reader, pong_wait) => outcome,
        };

        match outcome {
            ReadOutcome::Frame(Frame::Text(payload)) => {
                handle.touch(router.manager().now());
                inbound(&router, &handle, &payload).await;
            }
            ReadOutcome::Frame(Frame::Binary(bytes)) => {
                handle.touch(router.manager().now());
                match String::from_utf8(bytes) {
                    Ok(payload) => inbound(&router, &handle, &payload).await,
                    Err(e) => drop_invalid(&handle, &ValidationError::Malformed(e.to_string())),
                }
            }
            ReadOutcome::Frame(Frame::Pong(_)) => {
                handle.touch(router.manager().now());
                tracing::trace!("Pong from client '{}'", handle.id());
            }
            ReadOutcome::Frame(Frame::Ping(_)) => {
                handle.touch(router.manager().now());
            }
            ReadOutcome::Frame(Frame::Close) | ReadOutcome::Closed => {
                tracing::debug!("Client '{}' closed the connection", handle.id());
                break;
            }
            ReadOutcome::DeadlineExceeded => {
                tracing::warn!(
                    "Client '{}' missed the read deadline ({:?}); disconnecting",
                    handle.id(),
                    pong_wait
                );
                break;
            }
            ReadOutcome::Failed(e) => {
                tracing::debug!("Read from client '{}' failed: {}", handle.id(), e);
                break;
            }
        }
    }

    router.manager().deregister(&handle).await;
}

async fn inbound(router: &MessageRouter, handle: &ClientHandle, payload: &str) {
    if let Err(e) = router.handle_inbound(handle, payload).await {
        drop_invalid(handle, &e);
    }
}

fn drop_invalid(handle: &ClientHandle, error: &ValidationError) {
    tracing::warn!("Dropped invalid frame from client '{}': {}", handle.id(), error);
}

async fn write_loop<W>(router: MessageRouter, handle: ClientHandle, mut outbox: Outbox, mut writer: W)
where
    W: FrameWriter,
{
    let write_wait = router.config().write_wait();
    let mut ticker = heartbeat::ping_ticker(router.config().ping_period());

    loop {
        // outbox が詰まっていても ping を止めないよう、両方を公平に待つ
        tokio::select! {
            message = outbox.recv() => {
                let Some(message) = message else {
                    // outbox が閉じられた（deregister 済み）
                    if let Err(e) = heartbeat::write_with_deadline(write_wait, writer.close()).await {
                        tracing::debug!("Close to client '{}' failed: {}", handle.id(), e);
                    }
                    break;
                };

                let payload = match router.codec().encode(&message) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!("Failed to encode message for '{}': {}", handle.id(), e);
                        continue;
                    }
                };
                let write = writer.send_frame(Frame::Text(payload));
                if let Err(e) = heartbeat::write_with_deadline(write_wait, write).await {
                    tracing::warn!("Write to client '{}' failed: {}", handle.id(), e);
                    break;
                }
            }
            _ = ticker.tick() => {
                let ping = writer.send_frame(Frame::Ping(Vec::new()));
                if let Err(e) = heartbeat::write_with_deadline(write_wait, ping).await {
                    tracing::warn!("Ping to client '{}' failed: {}", handle.id(), e);
                    break;
                }
            }
        }
    }

    router.manager().deregister(&handle).await;
}
