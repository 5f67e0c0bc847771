//! Scoped ownership of a broker channel

use tracing::{debug, warn};

use super::BrokerChannel;
use crate::error::BrokerError;

/// Owns a [`BrokerChannel`] until it is released.
///
/// [`ChannelGuard::close`] releases the channel and consumes the guard, so a
/// channel is closed at most once. A guard dropped without `close` (early
/// return, panic, cancelled request) closes the channel on a spawned task.
pub struct ChannelGuard {
    channel: Option<Box<dyn BrokerChannel>>,
}

impl ChannelGuard {
    pub fn new(channel: Box<dyn BrokerChannel>) -> Self {
        Self {
            channel: Some(channel),
        }
    }

    pub async fn declare_queue(&mut self, name: &str, durable: bool) -> Result<(), BrokerError> {
        self.channel_mut()?.declare_queue(name, durable).await
    }

    pub async fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
        persistent: bool,
    ) -> Result<(), BrokerError> {
        self.channel_mut()?
            .publish(exchange, routing_key, body, persistent)
            .await
    }

    /// Releases the channel. Close failures are logged, not returned.
    pub async fn close(mut self) {
        if let Some(mut channel) = self.channel.take() {
            match channel.close().await {
                Ok(()) => debug!("Broker channel closed"),
                Err(e) => warn!(error = %e, "Failed to close broker channel"),
            }
        }
    }

    fn channel_mut(&mut self) -> Result<&mut Box<dyn BrokerChannel>, BrokerError> {
        self.channel
            .as_mut()
            .ok_or_else(|| BrokerError::Channel("channel already released".to_string()))
    }
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        let Some(mut channel) = self.channel.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = channel.close().await {
                        warn!(error = %e, "Failed to close abandoned broker channel");
                    }
                });
            }
            Err(_) => warn!("Broker channel dropped outside a runtime; leaving it to the broker"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{Broker, MemoryBroker};
    use std::time::Duration;

    async fn open(broker: &MemoryBroker) -> ChannelGuard {
        ChannelGuard::new(broker.connect(Duration::from_secs(1)).await.unwrap())
    }

    #[tokio::test]
    async fn test_close_releases_once() {
        let broker = MemoryBroker::new();
        let guard = open(&broker).await;

        guard.close().await;

        assert_eq!(broker.closes(), 1);
    }

    #[tokio::test]
    async fn test_drop_without_close_releases_in_background() {
        let broker = MemoryBroker::new();
        let guard = open(&broker).await;

        drop(guard);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(broker.closes(), 1);
    }

    #[tokio::test]
    async fn test_publish_through_guard() {
        let broker = MemoryBroker::new();
        let mut guard = open(&broker).await;

        guard.publish("", "q", b"payload", true).await.unwrap();
        guard.close().await;

        let published = broker.published();
        assert_eq!(published.len(), 1);
        assert!(published[0].persistent);
        assert_eq!(broker.closes(), 1);
    }
}
