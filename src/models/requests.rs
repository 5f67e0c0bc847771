//! Request DTOs for the node API
//!
//! Defines the structure of incoming request parameters.

use serde::Deserialize;

/// Query parameters for `POST /purchase`
///
/// # Fields
/// - `user_id`: Buyer id
/// - `event_id`: Event the tickets are for
/// - `quantity`: Number of tickets
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRequest {
    pub user_id: i64,
    pub event_id: i64,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_request_deserialize() {
        let json = r#"{"user_id": 1, "event_id": 999, "quantity": 2}"#;
        let req: PurchaseRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.user_id, 1);
        assert_eq!(req.event_id, 999);
        assert_eq!(req.quantity, 2);
    }

    #[test]
    fn test_purchase_request_rejects_non_integer() {
        let json = r#"{"user_id": "abc", "event_id": 999, "quantity": 2}"#;
        assert!(serde_json::from_str::<PurchaseRequest>(json).is_err());
    }

    #[test]
    fn test_purchase_request_requires_all_fields() {
        let json = r#"{"user_id": 1, "event_id": 999}"#;
        assert!(serde_json::from_str::<PurchaseRequest>(json).is_err());
    }
}
