//! Heartbeat timing: read deadline, ping ticker and bounded writes.

use std::{future::Future, time::Duration};

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::domain::{Frame, FrameReader, TransportError};

/// Result of one read attempt under the read deadline.
#[derive(Debug)]
pub(crate) enum ReadOutcome {
    Frame(Frame),
    /// The peer closed the stream.
    Closed,
    /// Nothing arrived within `pong_wait`.
    DeadlineExceeded,
    Failed(TransportError),
}

/// Read the next frame, giving up after `pong_wait`.
///
/// Each call starts a fresh deadline, so every successful read (a pong
/// included) pushes the deadline out to `now + pong_wait`.
pub(crate) async fn read_frame<R>(reader: &mut R, pong_wait: Duration) -> ReadOutcome
where
    R: FrameReader + ?Sized,
{
    match time::timeout(pong_wait, reader.next_frame()).await {
        Ok(Ok(Some(frame))) => ReadOutcome::Frame(frame),
        Ok(Ok(None)) => ReadOutcome::Closed,
        Ok(Err(e)) => ReadOutcome::Failed(e),
        Err(_) => ReadOutcome::DeadlineExceeded,
    }
}

/// Ping ticker whose first tick fires one full period after start.
pub(crate) fn ping_ticker(ping_period: Duration) -> Interval {
    let mut ticker = time::interval_at(Instant::now() + ping_period, ping_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Run one write attempt with the write deadline applied.
pub(crate) async fn write_with_deadline<F>(
    write_wait: Duration,
    write: F,
) -> Result<(), TransportError>
where
    F: Future<Output = Result<(), TransportError>>,
{
    time::timeout(write_wait, write)
        .await
        .map_err(|_| TransportError::WriteTimeout)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct SilentReader;

    #[async_trait]
    impl FrameReader for SilentReader {
        async fn next_frame(&mut self) -> Result<Option<Frame>, TransportError> {
            std::future::pending().await
        }
    }

    struct ScriptedReader(Vec<Result<Option<Frame>, TransportError>>);

    #[async_trait]
    impl FrameReader for ScriptedReader {
        async fn next_frame(&mut self) -> Result<Option<Frame>, TransportError> {
            self.0.remove(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_frame_times_out_after_pong_wait() {
        // テスト項目: pong_wait 以内に何も届かなければ期限切れになる
        // given (前提条件):
        let mut reader = SilentReader;
        let started = Instant::now();

        // when (操作):
        let outcome = read_frame(&mut reader, Duration::from_secs(40)).await;

        // then (期待する結果):
        assert!(matches!(outcome, ReadOutcome::DeadlineExceeded));
        assert_eq!(started.elapsed(), Duration::from_secs(40));
    }

    #[tokio::test]
    async fn test_read_frame_maps_reader_results() {
        // テスト項目: フレーム・切断・エラーがそれぞれ対応する結果になる
        // given (前提条件):
        let mut reader = ScriptedReader(vec![
            Ok(Some(Frame::Pong(vec![]))),
            Err(TransportError::Receive("reset".to_string())),
            Ok(None),
        ]);
        let wait = Duration::from_secs(1);

        // when (操作):
        let first = read_frame(&mut reader, wait).await;
        let second = read_frame(&mut reader, wait).await;
        let third = read_frame(&mut reader, wait).await;

        // then (期待する結果):
        assert!(matches!(first, ReadOutcome::Frame(Frame::Pong(_))));
        assert!(matches!(second, ReadOutcome::Failed(TransportError::Receive(_))));
        assert!(matches!(third, ReadOutcome::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_ticker_waits_one_period_before_first_tick() {
        // テスト項目: 最初の ping は接続直後ではなく 1 周期後に発火する
        // given (前提条件):
        let started = Instant::now();
        let mut ticker = ping_ticker(Duration::from_secs(30));

        // when (操作):
        ticker.tick().await;
        let first = started.elapsed();
        ticker.tick().await;
        let second = started.elapsed();

        // then (期待する結果):
        assert_eq!(first, Duration::from_secs(30));
        assert_eq!(second, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_with_deadline_reports_timeout() {
        // テスト項目: 書き込みが write_wait を超えると WriteTimeout になる
        // given (前提条件):
        let stalled = std::future::pending::<Result<(), TransportError>>();

        // when (操作):
        let result = write_with_deadline(Duration::from_secs(10), stalled).await;

        // then (期待する結果):
        assert_eq!(result, Err(TransportError::WriteTimeout));
    }

    #[tokio::test]
    async fn test_write_with_deadline_passes_through_errors() {
        // テスト項目: 期限内の書き込みエラーはそのまま返る
        // given (前提条件):
        let failing = async { Err(TransportError::Send("broken pipe".to_string())) };

        // when (操作):
        let result = write_with_deadline(Duration::from_secs(10), failing).await;

        // then (期待する結果):
        assert_eq!(result, Err(TransportError::Send("broken pipe".to_string())));
    }
}
