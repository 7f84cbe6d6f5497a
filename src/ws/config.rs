#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use std::time::Duration;

use backoff::backoff::Backoff as _;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

const DEFAULT_PING_INTERVAL_DURATION: Duration = Duration::from_secs(25);
const DEFAULT_CONNECT_TIMEOUT_DURATION: Duration = Duration::from_secs(10);
const DEFAULT_BASE_DELAY_DURATION: Duration = Duration::from_secs(3);
const DEFAULT_MAX_EXPONENTIAL_DELAY_DURATION: Duration = Duration::from_secs(60);
const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const EXPONENTIAL_MULTIPLIER: f64 = 2.0;

/// Configuration for WebSocket client behavior.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct Config {
    /// Interval for sending `ping` frames while the connection is open
    pub ping_interval: Duration,
    /// Longest wait for a connection attempt; a timeout counts as a failed attempt
    pub connect_timeout: Duration,
    /// Reconnection strategy configuration
    pub reconnect: ReconnectConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ping_interval: DEFAULT_PING_INTERVAL_DURATION,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_DURATION,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_ping_interval(mut self, ping_interval: Duration) -> Self {
        self.ping_interval = ping_interval;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }
}

/// How the delay grows between consecutive reconnection attempts.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffStrategy {
    /// `base_delay * attempt`
    #[default]
    Linear,
    /// `base_delay * 2^(attempt - 1)`, capped at `max_delay`
    Exponential {
        /// Upper bound for a single delay
        max_delay: Duration,
    },
}

impl BackoffStrategy {
    #[must_use]
    pub const fn exponential() -> Self {
        Self::Exponential {
            max_delay: DEFAULT_MAX_EXPONENTIAL_DELAY_DURATION,
        }
    }
}

/// Configuration for automatic reconnection behavior.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive reconnection attempts without a successful open
    pub max_attempts: u32,
    /// Delay unit for the first reconnection attempt
    pub base_delay: Duration,
    /// Growth of the delay between attempts
    pub strategy: BackoffStrategy,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY_DURATION,
            strategy: BackoffStrategy::Linear,
        }
    }
}

impl ReconnectConfig {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, strategy: BackoffStrategy) -> Self {
        Self {
            max_attempts,
            base_delay,
            strategy,
        }
    }

    /// Delay before the given 1-indexed reconnection attempt.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::Linear => self.base_delay.saturating_mul(attempt),
            BackoffStrategy::Exponential { max_delay } => {
                let mut backoff = self.exponential_backoff(max_delay);
                let mut delay = self.base_delay;
                for _ in 0..attempt.max(1) {
                    delay = backoff.next_backoff().unwrap_or(max_delay);
                }
                delay
            }
        }
    }

    fn exponential_backoff(&self, max_delay: Duration) -> ExponentialBackoff {
        ExponentialBackoffBuilder::default()
            .with_initial_interval(self.base_delay)
            .with_max_interval(max_delay)
            .with_multiplier(EXPONENTIAL_MULTIPLIER)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None) // Attempts are bounded by max_attempts instead
            .build()
    }
}
