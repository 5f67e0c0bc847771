//! RabbitMQ broker collaborator
//!
//! AMQP 0.9.1 through `lapin`. Every [`AmqpBroker::connect`] opens its own
//! connection and channel; [`AmqpChannel::close`] tears both down.

use std::time::Duration;

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tracing::{debug, warn};

use super::{Broker, BrokerChannel};
use crate::config::Config;
use crate::error::BrokerError;

/// AMQP delivery mode asking the broker to persist the message
const PERSISTENT_DELIVERY_MODE: u8 = 2;
const TRANSIENT_DELIVERY_MODE: u8 = 1;

const REPLY_SUCCESS: u16 = 200;

/// RabbitMQ-backed [`Broker`].
#[derive(Debug, Clone)]
pub struct AmqpBroker {
    /// `None` when no broker host is configured
    url: Option<String>,
    connection_name: String,
}

impl AmqpBroker {
    /// Creates a broker for `amqp://guest:guest@{host}:{port}/%2f`.
    pub fn new(host: Option<&str>, port: u16, connection_name: impl Into<String>) -> Self {
        Self {
            url: host.map(|h| format!("amqp://guest:guest@{}:{}/%2f", h, port)),
            connection_name: connection_name.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.rabbitmq_host.as_deref(),
            config.rabbitmq_port,
            format!("eventflow-node-{}", config.node_id),
        )
    }

    /// Connection URL with credentials removed, for logging.
    pub fn url_redacted(&self) -> Option<String> {
        self.url.as_ref().map(|url| match url.split_once('@') {
            Some((_, rest)) => format!("amqp://***@{}", rest),
            None => url.clone(),
        })
    }
}

#[async_trait]
impl Broker for AmqpBroker {
    async fn connect(&self, timeout: Duration) -> Result<Box<dyn BrokerChannel>, BrokerError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| BrokerError::Connect("RABBITMQ_HOST is not configured".to_string()))?;

        let properties = ConnectionProperties::default()
            .with_connection_name(self.connection_name.clone().into());

        let connection = match tokio::time::timeout(timeout, Connection::connect(url, properties))
            .await
        {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => {
                return Err(BrokerError::Connect(format!(
                    "RabbitMQ connection failed: {}",
                    e
                )))
            }
            Err(_) => {
                return Err(BrokerError::Connect(format!(
                    "RabbitMQ connection timed out after {:?}",
                    timeout
                )))
            }
        };

        let channel = match connection.create_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = connection
                    .close(REPLY_SUCCESS, "channel setup failed")
                    .await
                {
                    warn!(
                        error = %close_err,
                        "Failed to close RabbitMQ connection after channel error"
                    );
                }
                return Err(BrokerError::Channel(format!(
                    "RabbitMQ channel creation failed: {}",
                    e
                )));
            }
        };

        debug!(connection = %self.connection_name, "RabbitMQ channel opened");
        Ok(Box::new(AmqpChannel {
            connection,
            channel,
        }))
    }
}

/// Connection and channel pair owned by one publish.
pub struct AmqpChannel {
    connection: Connection,
    channel: Channel,
}

#[async_trait]
impl BrokerChannel for AmqpChannel {
    async fn declare_queue(&mut self, name: &str, durable: bool) -> Result<(), BrokerError> {
        self.channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Channel(format!("Queue declaration failed: {}", e)))?;
        Ok(())
    }

    async fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
        persistent: bool,
    ) -> Result<(), BrokerError> {
        let delivery_mode = if persistent {
            PERSISTENT_DELIVERY_MODE
        } else {
            TRANSIENT_DELIVERY_MODE
        };
        let properties = BasicProperties::default()
            .with_delivery_mode(delivery_mode)
            .with_content_type("application/json".into());

        let confirm = self
            .channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                body,
                properties,
            )
            .await
            .map_err(|e| BrokerError::Publish(format!("Publish failed: {}", e)))?;

        confirm
            .await
            .map_err(|e| BrokerError::Publish(format!("Publish confirmation failed: {}", e)))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrokerError> {
        let channel_result = self.channel.close(REPLY_SUCCESS, "OK").await;
        self.connection
            .close(REPLY_SUCCESS, "OK")
            .await
            .map_err(|e| BrokerError::Channel(format!("Connection close failed: {}", e)))?;
        channel_result
            .map_err(|e| BrokerError::Channel(format!("Channel close failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_is_redacted() {
        let broker = AmqpBroker::new(Some("rabbitmq"), 5672, "test");
        assert_eq!(
            broker.url_redacted().as_deref(),
            Some("amqp://***@rabbitmq:5672/%2f")
        );
    }

    #[tokio::test]
    async fn test_missing_host_fails_fast() {
        let broker = AmqpBroker::from_config(&Config::default());

        let result = broker.connect(Duration::from_millis(100)).await;
        assert!(matches!(result, Err(BrokerError::Connect(_))));
        assert!(broker.url_redacted().is_none());
    }
}
