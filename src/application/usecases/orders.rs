use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::usecases::gateway::PesapalGateway;
use crate::domain::entities::{orders::InsertOrderEntity, plans::PlanEntity};
use crate::domain::repositories::{orders::OrderRepository, plans::PlanRepository};
use crate::domain::value_objects::enums::order_statuses::OrderStatus;
use crate::domain::value_objects::orders::{
    CreatedOrderDto, OrderSubmission, generate_merchant_reference,
};
use crate::infrastructure::pesapal::client::IpnRegistration;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("plan not found")]
    PlanNotFound,
    #[error("pesapal notification id (IPN) not configured; register the IPN first")]
    IpnNotConfigured,
    #[error("pesapal rejected the order submission")]
    Gateway(#[source] anyhow::Error),
    #[error("pesapal accepted the order but returned no checkout url")]
    MissingCheckoutUrl,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OrderError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            OrderError::PlanNotFound => StatusCode::NOT_FOUND,
            OrderError::IpnNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            OrderError::Gateway(_) | OrderError::MissingCheckoutUrl => StatusCode::BAD_GATEWAY,
            OrderError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type OrderResult<T> = std::result::Result<T, OrderError>;

pub struct OrderUseCase<P, O, G>
where
    P: PlanRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    G: PesapalGateway + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    order_repo: Arc<O>,
    gateway: Arc<G>,
    ipn_id: Option<String>,
    callback_url: String,
}

impl<P, O, G> OrderUseCase<P, O, G>
where
    P: PlanRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    G: PesapalGateway + Send + Sync + 'static,
{
    pub fn new(
        plan_repo: Arc<P>,
        order_repo: Arc<O>,
        gateway: Arc<G>,
        ipn_id: Option<String>,
        callback_url: String,
    ) -> Self {
        Self {
            plan_repo,
            order_repo,
            gateway,
            ipn_id,
            callback_url,
        }
    }

    pub async fn create_order(
        &self,
        user_id: Uuid,
        user_email: Option<String>,
        plan_id: i64,
    ) -> OrderResult<CreatedOrderDto> {
        info!(%user_id, plan_id, "orders: create order requested");

        let plan = self
            .plan_repo
            .find_active_plan_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    plan_id,
                    db_error = ?err,
                    "orders: failed to load plan"
                );
                OrderError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = OrderError::PlanNotFound;
                warn!(
                    %user_id,
                    plan_id,
                    status = err.status_code().as_u16(),
                    "orders: unknown or inactive plan"
                );
                err
            })?;

        // The IPN must be registered before go-live; without its id the
        // gateway cannot notify us, so fail fast.
        let notification_id = self.ipn_id.clone().ok_or_else(|| {
            let err = OrderError::IpnNotConfigured;
            error!(
                %user_id,
                plan_id,
                status = err.status_code().as_u16(),
                "orders: notification id missing from configuration"
            );
            err
        })?;

        let merchant_reference = generate_merchant_reference(user_id);
        let description = format!("Subscription {} for user {}", plan.name, user_id);

        let submission = OrderSubmission {
            merchant_reference: merchant_reference.clone(),
            amount_minor: plan.price_minor,
            email: user_email.unwrap_or_default(),
            phone: String::new(),
            description,
            notification_id,
        };

        let submitted = match self.gateway.submit_order(submission).await {
            Ok(submitted) => submitted,
            Err(err) => {
                error!(
                    %user_id,
                    plan_id,
                    merchant_reference = %merchant_reference,
                    error = ?err,
                    "orders: pesapal order submission failed"
                );
                // Keep a record of the attempt even though the gateway refused it.
                self.persist_order(user_id, &plan, &merchant_reference, None, None, OrderStatus::Failed)
                    .await?;
                return Err(OrderError::Gateway(err));
            }
        };

        let Some(checkout_url) = submitted.checkout_url.clone() else {
            let err = OrderError::MissingCheckoutUrl;
            warn!(
                %user_id,
                plan_id,
                merchant_reference = %merchant_reference,
                status = err.status_code().as_u16(),
                raw = %submitted.raw,
                "orders: submission succeeded without a checkout url"
            );
            self.persist_order(
                user_id,
                &plan,
                &merchant_reference,
                submitted.tracking_id.clone(),
                None,
                OrderStatus::Pending,
            )
            .await?;
            return Err(err);
        };

        self.persist_order(
            user_id,
            &plan,
            &merchant_reference,
            submitted.tracking_id.clone(),
            Some(checkout_url.clone()),
            OrderStatus::Pending,
        )
        .await?;

        info!(
            %user_id,
            plan_id,
            merchant_reference = %merchant_reference,
            tracking_id = ?submitted.tracking_id,
            "orders: order created"
        );

        Ok(CreatedOrderDto {
            checkout_url,
            merchant_reference,
        })
    }

    pub async fn register_ipn(&self, callback_url: Option<String>) -> OrderResult<IpnRegistration> {
        let url = callback_url.unwrap_or_else(|| self.callback_url.clone());
        info!(callback_url = %url, "orders: registering ipn url");

        let registration = self.gateway.register_ipn(&url).await.map_err(|err| {
            error!(
                callback_url = %url,
                error = ?err,
                "orders: ipn registration failed"
            );
            OrderError::Gateway(err)
        })?;

        info!(
            ipn_id = %registration.ipn_id,
            "orders: ipn registered; persist the id to configuration"
        );

        Ok(registration)
    }

    async fn persist_order(
        &self,
        user_id: Uuid,
        plan: &PlanEntity,
        merchant_reference: &str,
        tracking_id: Option<String>,
        checkout_url: Option<String>,
        status: OrderStatus,
    ) -> OrderResult<i64> {
        self.order_repo
            .create_order(InsertOrderEntity {
                user_id,
                plan_id: plan.id,
                merchant_reference: merchant_reference.to_string(),
                tracking_id,
                amount_minor: plan.price_minor,
                status: status.to_string(),
                checkout_url,
                is_recurring: false,
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    plan_id = plan.id,
                    merchant_reference,
                    db_error = ?err,
                    "orders: failed to persist order"
                );
                OrderError::Internal(err)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::usecases::gateway::MockPesapalGateway;
    use crate::domain::repositories::orders::MockOrderRepository;
    use crate::domain::repositories::plans::MockPlanRepository;
    use crate::infrastructure::pesapal::client::SubmittedOrder;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn sample_plan(plan_id: i64) -> PlanEntity {
        PlanEntity {
            id: plan_id,
            name: "Gold".to_string(),
            price_minor: 100_000,
            duration_days: 30,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn usecase(
        plan_repo: MockPlanRepository,
        order_repo: MockOrderRepository,
        gateway: MockPesapalGateway,
        ipn_id: Option<String>,
    ) -> OrderUseCase<MockPlanRepository, MockOrderRepository, MockPesapalGateway> {
        OrderUseCase::new(
            Arc::new(plan_repo),
            Arc::new(order_repo),
            Arc::new(gateway),
            ipn_id,
            "https://svc.example/pesapal/ipn".to_string(),
        )
    }

    #[tokio::test]
    async fn persists_pending_order_and_returns_checkout_url() {
        let user_id = Uuid::new_v4();
        let plan_id = 7;

        let mut plan_repo = MockPlanRepository::new();
        let mut order_repo = MockOrderRepository::new();
        let mut gateway = MockPesapalGateway::new();

        let plan = sample_plan(plan_id);
        plan_repo
            .expect_find_active_plan_by_id()
            .with(eq(plan_id))
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        gateway
            .expect_submit_order()
            .withf(move |submission| {
                submission.amount_minor == 100_000
                    && submission.notification_id == "ipn-1"
                    && submission.merchant_reference.starts_with("sub_")
            })
            .returning(|_| {
                Box::pin(async {
                    Ok(SubmittedOrder {
                        checkout_url: Some("https://pay.pesapal.test/redirect".to_string()),
                        tracking_id: Some("trk-1".to_string()),
                        raw: serde_json::json!({}),
                    })
                })
            });

        order_repo
            .expect_create_order()
            .withf(move |insert| {
                insert.user_id == user_id
                    && insert.plan_id == plan_id
                    && insert.status == "PENDING"
                    && insert.checkout_url.as_deref() == Some("https://pay.pesapal.test/redirect")
                    && insert.tracking_id.as_deref() == Some("trk-1")
            })
            .returning(|_| Box::pin(async { Ok(1) }));

        let usecase = usecase(plan_repo, order_repo, gateway, Some("ipn-1".to_string()));

        let created = usecase
            .create_order(user_id, Some("user@example.com".to_string()), plan_id)
            .await
            .unwrap();

        assert_eq!(created.checkout_url, "https://pay.pesapal.test/redirect");
        assert!(created.merchant_reference.starts_with("sub_"));
    }

    #[tokio::test]
    async fn fails_fast_when_ipn_id_is_not_configured() {
        let user_id = Uuid::new_v4();
        let plan_id = 7;

        let mut plan_repo = MockPlanRepository::new();
        let order_repo = MockOrderRepository::new();
        let gateway = MockPesapalGateway::new();

        let plan = sample_plan(plan_id);
        plan_repo
            .expect_find_active_plan_by_id()
            .with(eq(plan_id))
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        let usecase = usecase(plan_repo, order_repo, gateway, None);

        let err = usecase
            .create_order(user_id, None, plan_id)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::IpnNotConfigured));
        assert_eq!(err.status_code().as_u16(), 500);
    }

    #[tokio::test]
    async fn unknown_plan_is_not_found() {
        let user_id = Uuid::new_v4();

        let mut plan_repo = MockPlanRepository::new();
        let order_repo = MockOrderRepository::new();
        let gateway = MockPesapalGateway::new();

        plan_repo
            .expect_find_active_plan_by_id()
            .with(eq(42))
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = usecase(plan_repo, order_repo, gateway, Some("ipn-1".to_string()));

        let err = usecase.create_order(user_id, None, 42).await.unwrap_err();

        assert!(matches!(err, OrderError::PlanNotFound));
        assert_eq!(err.status_code().as_u16(), 404);
    }

    #[tokio::test]
    async fn gateway_failure_still_persists_a_failed_order() {
        let user_id = Uuid::new_v4();
        let plan_id = 7;

        let mut plan_repo = MockPlanRepository::new();
        let mut order_repo = MockOrderRepository::new();
        let mut gateway = MockPesapalGateway::new();

        let plan = sample_plan(plan_id);
        plan_repo
            .expect_find_active_plan_by_id()
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        gateway
            .expect_submit_order()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("503 from gateway")) }));

        order_repo
            .expect_create_order()
            .withf(|insert| {
                insert.status == "FAILED"
                    && insert.checkout_url.is_none()
                    && insert.tracking_id.is_none()
            })
            .returning(|_| Box::pin(async { Ok(1) }));

        let usecase = usecase(plan_repo, order_repo, gateway, Some("ipn-1".to_string()));

        let err = usecase
            .create_order(user_id, None, plan_id)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Gateway(_)));
        assert_eq!(err.status_code().as_u16(), 502);
    }

    #[tokio::test]
    async fn accepted_order_without_checkout_url_is_an_explicit_error() {
        let user_id = Uuid::new_v4();
        let plan_id = 7;

        let mut plan_repo = MockPlanRepository::new();
        let mut order_repo = MockOrderRepository::new();
        let mut gateway = MockPesapalGateway::new();

        let plan = sample_plan(plan_id);
        plan_repo
            .expect_find_active_plan_by_id()
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        gateway.expect_submit_order().returning(|_| {
            Box::pin(async {
                Ok(SubmittedOrder {
                    checkout_url: None,
                    tracking_id: Some("trk-1".to_string()),
                    raw: serde_json::json!({ "order_tracking_id": "trk-1" }),
                })
            })
        });

        order_repo
            .expect_create_order()
            .withf(|insert| {
                insert.status == "PENDING"
                    && insert.checkout_url.is_none()
                    && insert.tracking_id.as_deref() == Some("trk-1")
            })
            .returning(|_| Box::pin(async { Ok(1) }));

        let usecase = usecase(plan_repo, order_repo, gateway, Some("ipn-1".to_string()));

        let err = usecase
            .create_order(user_id, None, plan_id)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::MissingCheckoutUrl));
    }

    #[tokio::test]
    async fn register_ipn_falls_back_to_configured_callback_url() {
        let plan_repo = MockPlanRepository::new();
        let order_repo = MockOrderRepository::new();
        let mut gateway = MockPesapalGateway::new();

        gateway
            .expect_register_ipn()
            .withf(|url| url == "https://svc.example/pesapal/ipn")
            .returning(|_| {
                Box::pin(async {
                    Ok(IpnRegistration {
                        ipn_id: "ipn-9".to_string(),
                        url: Some("https://svc.example/pesapal/ipn".to_string()),
                        raw: serde_json::json!({}),
                    })
                })
            });

        let usecase = usecase(plan_repo, order_repo, gateway, None);

        let registration = usecase.register_ipn(None).await.unwrap();

        assert_eq!(registration.ipn_id, "ipn-9");
    }
}
