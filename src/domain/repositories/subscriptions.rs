use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::SubscriptionEntity;

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    /// Creates the next entitlement period for the user, stacking onto an
    /// unexpired active period when one exists. Serialized per user.
    async fn activate_period(
        &self,
        user_id: Uuid,
        plan_id: i64,
        duration_days: i32,
        gateway_correlation_id: Option<String>,
    ) -> Result<SubscriptionEntity>;
}
