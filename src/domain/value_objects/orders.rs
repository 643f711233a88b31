use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderModel {
    pub plan_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrderDto {
    pub checkout_url: String,
    pub merchant_reference: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckStatusModel {
    pub merchant_reference: String,
}

/// Everything the gateway needs to construct a remote order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSubmission {
    pub merchant_reference: String,
    pub amount_minor: i32,
    pub email: String,
    pub phone: String,
    pub description: String,
    pub notification_id: String,
}

/// Merchant references correlate local orders with the gateway. Unique per
/// attempt and assigned before the first remote call.
pub fn generate_merchant_reference(user_id: Uuid) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("sub_{}_{}", user_id, &suffix[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merchant_references_are_unique_per_attempt() {
        let user_id = Uuid::new_v4();

        let first = generate_merchant_reference(user_id);
        let second = generate_merchant_reference(user_id);

        assert_ne!(first, second);
        assert!(first.starts_with(&format!("sub_{}_", user_id)));
    }

    #[test]
    fn merchant_reference_carries_twelve_char_suffix() {
        let user_id = Uuid::new_v4();

        let reference = generate_merchant_reference(user_id);
        let suffix = reference.rsplit('_').next().unwrap();

        assert_eq!(suffix.len(), 12);
    }
}
