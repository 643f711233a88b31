use anyhow::Result as AnyResult;
use async_trait::async_trait;

use crate::domain::value_objects::orders::OrderSubmission;
use crate::infrastructure::pesapal::client::{
    IpnRegistration, PesapalClient, SubmittedOrder, TransactionStatus,
};

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait PesapalGateway: Send + Sync {
    async fn register_ipn(&self, callback_url: &str) -> AnyResult<IpnRegistration>;
    async fn submit_order(&self, submission: OrderSubmission) -> AnyResult<SubmittedOrder>;
    async fn transaction_status(&self, tracking_id: &str) -> AnyResult<TransactionStatus>;
}

#[async_trait]
impl PesapalGateway for PesapalClient {
    async fn register_ipn(&self, callback_url: &str) -> AnyResult<IpnRegistration> {
        self.register_ipn(callback_url).await
    }

    async fn submit_order(&self, submission: OrderSubmission) -> AnyResult<SubmittedOrder> {
        self.submit_order(submission).await
    }

    async fn transaction_status(&self, tracking_id: &str) -> AnyResult<TransactionStatus> {
        self.transaction_status(tracking_id).await
    }
}
