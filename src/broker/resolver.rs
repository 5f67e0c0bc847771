//! Connection Resolver
//!
//! Lazily connects to the broker right before a publish, retrying a bounded
//! number of times with a constant delay. Retries block only the calling
//! request; there is no background reconnect task.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::{Broker, ChannelGuard, TRANSACTION_QUEUE};
use crate::config::Config;
use crate::error::BrokerError;

/// Retry budget for acquiring a broker channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total connection attempts; zero is treated as one
    pub max_retries: u32,
    /// Constant wait between attempts
    pub delay: Duration,
    /// Bound on each attempt: connect, channel setup and queue declaration
    pub connect_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.broker_max_retries,
            delay: config.broker_retry_delay(),
            connect_timeout: config.broker_connect_timeout(),
        }
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

/// Acquires a channel with [`TRANSACTION_QUEUE`] declared durable.
///
/// Returns the first channel that connects and declares the queue. After
/// `policy.max_retries` failed attempts returns [`BrokerError::Exhausted`];
/// the caller decides how to report it.
pub async fn acquire_channel(
    broker: &dyn Broker,
    policy: &RetryPolicy,
) -> Result<ChannelGuard, BrokerError> {
    let attempts = policy.attempts();
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        let outcome = match tokio::time::timeout(
            policy.connect_timeout,
            try_acquire(broker, policy.connect_timeout),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(BrokerError::Connect(format!(
                "Broker channel setup timed out after {:?}",
                policy.connect_timeout
            ))),
        };

        match outcome {
            Ok(guard) => {
                if attempt > 1 {
                    info!(attempt, "Broker channel acquired after retry");
                } else {
                    debug!("Broker channel acquired");
                }
                return Ok(guard);
            }
            Err(e) => {
                last_error = e.to_string();
                if attempt < attempts {
                    warn!(
                        attempt,
                        max_retries = attempts,
                        delay_ms = policy.delay.as_millis() as u64,
                        error = %e,
                        "Broker connection failed, retrying"
                    );
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    Err(BrokerError::Exhausted {
        attempts,
        last_error,
    })
}

async fn try_acquire(broker: &dyn Broker, timeout: Duration) -> Result<ChannelGuard, BrokerError> {
    let mut guard = ChannelGuard::new(broker.connect(timeout).await?);

    if let Err(e) = guard.declare_queue(TRANSACTION_QUEUE, true).await {
        guard.close().await;
        return Err(e);
    }
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{BrokerChannel, MemoryBroker};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    /// Connects at once, then never answers the queue declaration.
    #[derive(Default)]
    struct StalledDeclareBroker {
        connects: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
    }

    struct StalledChannel {
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Broker for StalledDeclareBroker {
        async fn connect(&self, _timeout: Duration) -> Result<Box<dyn BrokerChannel>, BrokerError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StalledChannel {
                closes: self.closes.clone(),
            }))
        }
    }

    #[async_trait]
    impl BrokerChannel for StalledChannel {
        async fn declare_queue(&mut self, _name: &str, _durable: bool) -> Result<(), BrokerError> {
            std::future::pending::<()>().await;
            Ok(())
        }

        async fn publish(
            &mut self,
            _exchange: &str,
            _routing_key: &str,
            _body: &[u8],
            _persistent: bool,
        ) -> Result<(), BrokerError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), BrokerError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn policy(max_retries: u32, delay_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            delay: Duration::from_millis(delay_ms),
            connect_timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_succeeds_without_waiting() {
        let broker = MemoryBroker::new();
        let start = Instant::now();

        let guard = acquire_channel(&broker, &policy(5, 1000)).await.unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(broker.connect_attempts(), 1);
        assert_eq!(
            broker.declared_queues(),
            vec![(TRANSACTION_QUEUE.to_string(), true)]
        );
        guard.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_n_failures() {
        let broker = MemoryBroker::new();
        broker.fail_next_connects(3);
        let start = Instant::now();

        let guard = acquire_channel(&broker, &policy(5, 1000)).await.unwrap();

        assert_eq!(broker.connect_attempts(), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(3 * 1000));
        guard.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_retries() {
        let broker = MemoryBroker::new();
        broker.set_offline(true);
        let start = Instant::now();

        let result = acquire_channel(&broker, &policy(5, 1000)).await;

        match result {
            Err(BrokerError::Exhausted { attempts, .. }) => assert_eq!(attempts, 5),
            _ => panic!("expected exhausted retries"),
        }
        assert_eq!(broker.connect_attempts(), 5);
        // No sleep after the final attempt
        assert_eq!(start.elapsed(), Duration::from_millis(4 * 1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_still_attempts_once() {
        let broker = MemoryBroker::new();
        broker.set_offline(true);

        let result = acquire_channel(&broker, &policy(0, 1000)).await;

        assert!(matches!(
            result,
            Err(BrokerError::Exhausted { attempts: 1, .. })
        ));
        assert_eq!(broker.connect_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_declare_closes_channel_and_retries() {
        let broker = MemoryBroker::new();
        broker.fail_next_declares(1);

        let guard = acquire_channel(&broker, &policy(3, 500)).await.unwrap();

        assert_eq!(broker.connect_attempts(), 2);
        assert_eq!(broker.channels_opened(), 2);
        assert_eq!(broker.closes(), 1);
        guard.close().await;
        assert_eq!(broker.closes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_declare_is_bounded_per_attempt() {
        let broker = StalledDeclareBroker::default();
        let policy = RetryPolicy {
            max_retries: 5,
            delay: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(2),
        };
        let start = Instant::now();

        let result = tokio::time::timeout(
            Duration::from_secs(60),
            acquire_channel(&broker, &policy),
        )
        .await
        .expect("every attempt is bounded by the connect timeout");

        assert!(matches!(
            result,
            Err(BrokerError::Exhausted { attempts: 5, .. })
        ));
        assert_eq!(broker.connects.load(Ordering::SeqCst), 5);
        // Five 2s attempts plus four 1s delays
        assert_eq!(start.elapsed(), Duration::from_secs(14));

        // Abandoned channels are released in the background
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(broker.closes.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_policy_from_config() {
        let config = Config {
            broker_max_retries: 3,
            broker_retry_delay_ms: 250,
            ..Config::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay, Duration::from_millis(250));
        assert_eq!(policy.connect_timeout, Duration::from_secs(2));
        assert_eq!(RetryPolicy::default().max_retries, 5);
    }
}
