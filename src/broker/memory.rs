//! In-process broker
//!
//! Scriptable [`Broker`] that records every connect, declare, publish and
//! close so the resilience rules of the write path can be checked without
//! RabbitMQ.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::{Broker, BrokerChannel};
use crate::error::BrokerError;

/// A message accepted by [`MemoryBroker`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub exchange: String,
    pub routing_key: String,
    pub body: Vec<u8>,
    pub persistent: bool,
}

#[derive(Debug, Default)]
struct State {
    offline: AtomicBool,
    failing_publishes: AtomicBool,
    connect_failures_left: AtomicU32,
    declare_failures_left: AtomicU32,
    connect_attempts: AtomicUsize,
    channels_opened: AtomicUsize,
    closes: AtomicUsize,
    declared: Mutex<Vec<(String, bool)>>,
    published: Mutex<Vec<PublishedMessage>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory [`Broker`] with failure injection.
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    state: Arc<State>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// When offline every connection attempt fails.
    pub fn set_offline(&self, offline: bool) {
        self.state.offline.store(offline, Ordering::SeqCst);
    }

    /// Fails the next `n` connection attempts, then connects normally.
    pub fn fail_next_connects(&self, n: u32) {
        self.state.connect_failures_left.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` queue declarations.
    pub fn fail_next_declares(&self, n: u32) {
        self.state.declare_failures_left.store(n, Ordering::SeqCst);
    }

    /// When set, every publish is rejected.
    pub fn set_failing_publishes(&self, failing: bool) {
        self.state.failing_publishes.store(failing, Ordering::SeqCst);
    }

    pub fn connect_attempts(&self) -> usize {
        self.state.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn channels_opened(&self) -> usize {
        self.state.channels_opened.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Queue declarations as `(name, durable)`, in order.
    pub fn declared_queues(&self) -> Vec<(String, bool)> {
        locked(&self.state.declared).clone()
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        locked(&self.state.published).clone()
    }
}

/// Decrements `counter` if positive, returning whether it was.
fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn connect(&self, _timeout: Duration) -> Result<Box<dyn BrokerChannel>, BrokerError> {
        let attempt = self.state.connect_attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if self.state.offline.load(Ordering::SeqCst)
            || take_one(&self.state.connect_failures_left)
        {
            return Err(BrokerError::Connect(format!(
                "connection refused (attempt {})",
                attempt
            )));
        }

        self.state.channels_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryChannel {
            state: Arc::clone(&self.state),
            closed: false,
        }))
    }
}

struct MemoryChannel {
    state: Arc<State>,
    closed: bool,
}

impl MemoryChannel {
    fn ensure_open(&self) -> Result<(), BrokerError> {
        if self.closed {
            return Err(BrokerError::Channel("channel is closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BrokerChannel for MemoryChannel {
    async fn declare_queue(&mut self, name: &str, durable: bool) -> Result<(), BrokerError> {
        self.ensure_open()?;
        if take_one(&self.state.declare_failures_left) {
            return Err(BrokerError::Channel(format!(
                "queue declaration for '{}' rejected",
                name
            )));
        }

        locked(&self.state.declared).push((name.to_string(), durable));
        Ok(())
    }

    async fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
        persistent: bool,
    ) -> Result<(), BrokerError> {
        self.ensure_open()?;
        if self.state.failing_publishes.load(Ordering::SeqCst) {
            return Err(BrokerError::Publish("publish rejected".to_string()));
        }

        locked(&self.state.published).push(PublishedMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            body: body.to_vec(),
            persistent,
        });
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrokerError> {
        self.ensure_open()?;
        self.closed = true;
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
