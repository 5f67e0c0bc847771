//! Broker Module
//!
//! Message broker collaborators and the connection resolver used by the
//! write path. A channel is never shared between publishes: each publish
//! acquires one through [`acquire_channel`] and releases it through
//! [`ChannelGuard`].

mod amqp;
mod guard;
mod memory;
mod resolver;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BrokerError;

pub use amqp::AmqpBroker;
pub use guard::ChannelGuard;
pub use memory::{MemoryBroker, PublishedMessage};
pub use resolver::{acquire_channel, RetryPolicy};

// == Public Constants ==
/// Durable queue receiving purchase transactions
pub const TRANSACTION_QUEUE: &str = "transaction_queue";

/// Default exchange; routes by queue name
pub const DEFAULT_EXCHANGE: &str = "";

/// Opens connections to the broker.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Connects and opens a channel, giving up after `timeout`.
    async fn connect(&self, timeout: Duration) -> Result<Box<dyn BrokerChannel>, BrokerError>;
}

/// A connection plus channel owned by a single publish operation.
#[async_trait]
pub trait BrokerChannel: Send {
    /// Declares `name`; declaring an existing queue is a no-op.
    async fn declare_queue(&mut self, name: &str, durable: bool) -> Result<(), BrokerError>;

    /// Publishes `body`. `persistent` asks the broker to keep the message
    /// across restarts.
    async fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
        persistent: bool,
    ) -> Result<(), BrokerError>;

    /// Closes the channel and its connection.
    async fn close(&mut self) -> Result<(), BrokerError>;
}
