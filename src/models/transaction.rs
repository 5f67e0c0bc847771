//! Purchase transaction handed to the broker

use serde::{Deserialize, Serialize};

/// Number of random bytes behind a transaction id.
const TRANSACTION_ID_BYTES: usize = 8;

/// A ticket purchase accepted for asynchronous processing.
///
/// Built once per request and never persisted locally; its only durability
/// is the broker queue it is published to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseTransaction {
    pub user_id: i64,
    pub event_id: i64,
    pub quantity: i64,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    /// 16 lowercase hex characters
    pub transaction_id: String,
}

impl PurchaseTransaction {
    /// Creates a transaction stamped with the current time and a fresh id.
    pub fn new(user_id: i64, event_id: i64, quantity: i64) -> Self {
        Self {
            user_id,
            event_id,
            quantity,
            timestamp: epoch_seconds(),
            transaction_id: generate_transaction_id(),
        }
    }
}

/// Returns a transaction id: 8 random bytes, hex encoded.
pub fn generate_transaction_id() -> String {
    let bytes: [u8; TRANSACTION_ID_BYTES] = rand::random();
    hex::encode(bytes)
}

fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
