//! Router configuration.

use std::time::Duration;

use thiserror::Error;

/// Default interval between pings.
pub const DEFAULT_PING_PERIOD: Duration = Duration::from_secs(30);
/// Default read deadline after the last inbound frame or pong.
pub const DEFAULT_PONG_WAIT: Duration = Duration::from_secs(40);
/// Default bound on a single write attempt.
pub const DEFAULT_WRITE_WAIT: Duration = Duration::from_secs(10);
/// Default number of messages an outbox can hold before the client is evicted.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// At least one ping/pong round-trip must fit inside the read deadline.
    #[error("pong wait ({pong_wait:?}) must be longer than ping period ({ping_period:?})")]
    PongWaitTooShort {
        ping_period: Duration,
        pong_wait: Duration,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Heartbeat timings and outbox sizing shared by every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    ping_period: Duration,
    pong_wait: Duration,
    write_wait: Duration,
    outbox_capacity: usize,
}

impl RouterConfig {
    pub fn new(
        ping_period: Duration,
        pong_wait: Duration,
        write_wait: Duration,
        outbox_capacity: usize,
    ) -> Result<Self, ConfigError> {
        if ping_period.is_zero() {
            return Err(ConfigError::Zero("ping period"));
        }
        if write_wait.is_zero() {
            return Err(ConfigError::Zero("write wait"));
        }
        if outbox_capacity == 0 {
            return Err(ConfigError::Zero("outbox capacity"));
        }
        if pong_wait <= ping_period {
            return Err(ConfigError::PongWaitTooShort {
                ping_period,
                pong_wait,
            });
        }

        Ok(Self {
            ping_period,
            pong_wait,
            write_wait,
            outbox_capacity,
        })
    }

    pub fn ping_period(&self) -> Duration {
        self.ping_period
    }

    pub fn pong_wait(&self) -> Duration {
        self.pong_wait
    }

    pub fn write_wait(&self) -> Duration {
        self.write_wait
    }

    pub fn outbox_capacity(&self) -> usize {
        self.outbox_capacity
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            ping_period: DEFAULT_PING_PERIOD,
            pong_wait: DEFAULT_PONG_WAIT,
            write_wait: DEFAULT_WRITE_WAIT,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}
