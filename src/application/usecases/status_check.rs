use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::usecases::gateway::PesapalGateway;
use crate::domain::repositories::orders::OrderRepository;
use crate::infrastructure::pesapal::client::TransactionStatus;

#[derive(Debug, Error)]
pub enum StatusCheckError {
    #[error("order not found")]
    OrderNotFound,
    #[error("order has no tracking id yet")]
    NoTrackingId,
    #[error("failed to fetch transaction status from pesapal")]
    Gateway(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StatusCheckError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            StatusCheckError::OrderNotFound => StatusCode::NOT_FOUND,
            StatusCheckError::NoTrackingId => StatusCode::BAD_REQUEST,
            StatusCheckError::Gateway(_) => StatusCode::BAD_GATEWAY,
            StatusCheckError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type StatusCheckResult<T> = std::result::Result<T, StatusCheckError>;

/// Pure read-through: looks up the order and returns the gateway's live
/// status verbatim. Local state is never mutated here.
pub struct StatusCheckUseCase<O, G>
where
    O: OrderRepository + Send + Sync + 'static,
    G: PesapalGateway + Send + Sync + 'static,
{
    order_repo: Arc<O>,
    gateway: Arc<G>,
}

impl<O, G> StatusCheckUseCase<O, G>
where
    O: OrderRepository + Send + Sync + 'static,
    G: PesapalGateway + Send + Sync + 'static,
{
    pub fn new(order_repo: Arc<O>, gateway: Arc<G>) -> Self {
        Self {
            order_repo,
            gateway,
        }
    }

    pub async fn check_status(
        &self,
        merchant_reference: &str,
    ) -> StatusCheckResult<TransactionStatus> {
        info!(merchant_reference, "status_check: live status requested");

        let order = self
            .order_repo
            .find_by_merchant_reference(merchant_reference)
            .await
            .map_err(|err| {
                error!(
                    merchant_reference,
                    db_error = ?err,
                    "status_check: order lookup failed"
                );
                StatusCheckError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = StatusCheckError::OrderNotFound;
                warn!(
                    merchant_reference,
                    status = err.status_code().as_u16(),
                    "status_check: no order for merchant reference"
                );
                err
            })?;

        let Some(tracking_id) = order.tracking_id.as_deref() else {
            let err = StatusCheckError::NoTrackingId;
            warn!(
                merchant_reference,
                order_id = order.id,
                status = err.status_code().as_u16(),
                "status_check: order has no tracking id yet"
            );
            return Err(err);
        };

        let status = self
            .gateway
            .transaction_status(tracking_id)
            .await
            .map_err(|err| {
                error!(
                    merchant_reference,
                    tracking_id,
                    error = ?err,
                    "status_check: live status query failed"
                );
                StatusCheckError::Gateway(err)
            })?;

        info!(
            merchant_reference,
            verified_status = ?status.status,
            "status_check: live status fetched"
        );

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::usecases::gateway::MockPesapalGateway;
    use crate::domain::entities::orders::OrderEntity;
    use crate::domain::repositories::orders::MockOrderRepository;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_order(tracking_id: Option<&str>) -> OrderEntity {
        let now = Utc::now();
        OrderEntity {
            id: 11,
            user_id: Uuid::new_v4(),
            plan_id: 7,
            merchant_reference: "sub_u_abc123def456".to_string(),
            tracking_id: tracking_id.map(str::to_string),
            amount_minor: 100_000,
            status: "PENDING".to_string(),
            checkout_url: None,
            is_recurring: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn returns_live_status_without_mutating_the_order() {
        let mut order_repo = MockOrderRepository::new();
        // Only a read expectation is registered: any write would panic.
        order_repo
            .expect_find_by_merchant_reference()
            .withf(|reference| reference == "sub_u_abc123def456")
            .returning(|_| Box::pin(async { Ok(Some(sample_order(Some("trk-1")))) }));

        let mut gateway = MockPesapalGateway::new();
        gateway
            .expect_transaction_status()
            .withf(|tracking_id| tracking_id == "trk-1")
            .returning(|_| {
                Box::pin(async {
                    Ok(TransactionStatus {
                        status: Some("PENDING".to_string()),
                        tracking_id: Some("trk-1".to_string()),
                        merchant_reference: Some("sub_u_abc123def456".to_string()),
                        raw: serde_json::json!({ "status": "PENDING" }),
                    })
                })
            });

        let usecase = StatusCheckUseCase::new(Arc::new(order_repo), Arc::new(gateway));

        let status = usecase.check_status("sub_u_abc123def456").await.unwrap();

        assert_eq!(status.status.as_deref(), Some("PENDING"));
        assert_eq!(status.raw, serde_json::json!({ "status": "PENDING" }));
    }

    #[tokio::test]
    async fn unknown_merchant_reference_is_not_found() {
        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_find_by_merchant_reference()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase =
            StatusCheckUseCase::new(Arc::new(order_repo), Arc::new(MockPesapalGateway::new()));

        let err = usecase.check_status("sub_missing").await.unwrap_err();

        assert!(matches!(err, StatusCheckError::OrderNotFound));
        assert_eq!(err.status_code().as_u16(), 404);
    }

    #[tokio::test]
    async fn order_without_tracking_id_is_rejected() {
        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_find_by_merchant_reference()
            .returning(|_| Box::pin(async { Ok(Some(sample_order(None))) }));

        // The gateway mock has no expectations: it must never be queried.
        let usecase =
            StatusCheckUseCase::new(Arc::new(order_repo), Arc::new(MockPesapalGateway::new()));

        let err = usecase.check_status("sub_u_abc123def456").await.unwrap_err();

        assert!(matches!(err, StatusCheckError::NoTrackingId));
        assert_eq!(err.status_code().as_u16(), 400);
    }
}
