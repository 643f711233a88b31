use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::orders::{InsertOrderEntity, OrderEntity};

#[async_trait]
#[automock]
pub trait OrderRepository {
    async fn create_order(&self, insert_order_entity: InsertOrderEntity) -> Result<i64>;
    async fn find_by_merchant_reference(
        &self,
        merchant_reference: &str,
    ) -> Result<Option<OrderEntity>>;
    async fn find_by_tracking_id(&self, tracking_id: &str) -> Result<Option<OrderEntity>>;
    /// Conditionally transitions the order to COMPLETED and stores the
    /// tracking id. Returns false when the order had already completed, so a
    /// redelivered notification observes no transition.
    async fn mark_completed(&self, order_id: i64, tracking_id: &str) -> Result<bool>;
}
