//! Resilient Publisher
//!
//! Queues purchase transactions on the durable broker queue. Connection
//! retries belong to the resolver; the publish itself is attempted once.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::broker::{acquire_channel, Broker, RetryPolicy, DEFAULT_EXCHANGE, TRANSACTION_QUEUE};
use crate::error::{Result, ServiceError};
use crate::models::PurchaseTransaction;

/// Write-path orchestration: acquire, publish, release.
#[derive(Clone)]
pub struct Publisher {
    broker: Arc<dyn Broker>,
    policy: RetryPolicy,
}

impl Publisher {
    pub fn new(broker: Arc<dyn Broker>, policy: RetryPolicy) -> Self {
        Self { broker, policy }
    }

    // == Publish ==
    /// Publishes `transaction` as a persistent message on the transaction queue.
    ///
    /// The acquired channel is closed exactly once whatever the publish
    /// outcome.
    pub async fn publish(&self, transaction: &PurchaseTransaction) -> Result<()> {
        let mut channel = acquire_channel(self.broker.as_ref(), &self.policy)
            .await
            .map_err(|e| {
                error!(
                    transaction_id = %transaction.transaction_id,
                    error = %e,
                    "CRITICAL: broker unavailable, transaction not queued"
                );
                ServiceError::BrokerUnavailable(e.to_string())
            })?;

        let outcome = match serde_json::to_vec(transaction) {
            Ok(body) => channel
                .publish(DEFAULT_EXCHANGE, TRANSACTION_QUEUE, &body, true)
                .await
                .map_err(|e| ServiceError::PublishFailed(e.to_string())),
            Err(e) => Err(ServiceError::PublishFailed(format!(
                "Could not serialize transaction: {}",
                e
            ))),
        };

        channel.close().await;

        match &outcome {
            Ok(()) => info!(
                transaction_id = %transaction.transaction_id,
                event_id = transaction.event_id,
                quantity = transaction.quantity,
                "Transaction queued"
            ),
            Err(e) => warn!(
                transaction_id = %transaction.transaction_id,
                error = %e,
                "Transaction publish failed"
            ),
        }
        outcome
    }
}
