use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::usecases::gateway::PesapalGateway;
use crate::domain::repositories::{
    ipn_logs::IpnLogRepository, orders::OrderRepository, plans::PlanRepository,
    subscriptions::SubscriptionRepository,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpnOutcome {
    SubscriptionActivated,
    AlreadyProcessed,
    PaymentNotCompleted,
}

impl IpnOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            IpnOutcome::SubscriptionActivated => "Subscription activated",
            IpnOutcome::AlreadyProcessed => "Notification already processed",
            IpnOutcome::PaymentNotCompleted => "Payment not completed",
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification payload is missing a tracking id")]
    MissingTrackingId,
    #[error("failed to verify transaction with pesapal")]
    VerificationFailed(#[source] anyhow::Error),
    #[error("no order matches the notification")]
    OrderNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl NotificationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            NotificationError::MissingTrackingId => StatusCode::BAD_REQUEST,
            NotificationError::VerificationFailed(_) => StatusCode::BAD_GATEWAY,
            NotificationError::OrderNotFound => StatusCode::NOT_FOUND,
            NotificationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type NotificationResult<T> = std::result::Result<T, NotificationError>;

/// Correlation keys pushed in the notification body. The gateway is
/// inconsistent about casing across environments, so every observed variant
/// is declared as an alias.
#[derive(Debug, Default, Deserialize)]
struct IpnPayloadFields {
    #[serde(
        default,
        alias = "order_tracking_id",
        alias = "orderTrackingId",
        alias = "OrderTrackingId"
    )]
    tracking_id: Option<String>,
    #[serde(
        default,
        alias = "merchant_reference",
        alias = "merchantReference",
        alias = "OrderMerchantReference"
    )]
    merchant_reference: Option<String>,
}

pub struct NotificationUseCase<O, P, S, L, G>
where
    O: OrderRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    L: IpnLogRepository + Send + Sync + 'static,
    G: PesapalGateway + Send + Sync + 'static,
{
    order_repo: Arc<O>,
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
    ipn_log_repo: Arc<L>,
    gateway: Arc<G>,
}

impl<O, P, S, L, G> NotificationUseCase<O, P, S, L, G>
where
    O: OrderRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    L: IpnLogRepository + Send + Sync + 'static,
    G: PesapalGateway + Send + Sync + 'static,
{
    pub fn new(
        order_repo: Arc<O>,
        plan_repo: Arc<P>,
        subscription_repo: Arc<S>,
        ipn_log_repo: Arc<L>,
        gateway: Arc<G>,
    ) -> Self {
        Self {
            order_repo,
            plan_repo,
            subscription_repo,
            ipn_log_repo,
            gateway,
        }
    }

    pub async fn handle_ipn(&self, payload: serde_json::Value) -> NotificationResult<IpnOutcome> {
        info!(payload = %payload, "notifications: ipn payload received");

        // Audit first: the raw payload is durably logged before any
        // processing, so no notification is lost if a later step fails.
        let log_id = self
            .ipn_log_repo
            .record_payload(payload.clone())
            .await
            .map_err(|err| {
                error!(db_error = ?err, "notifications: failed to record ipn payload");
                NotificationError::Internal(err)
            })?;

        let fields: IpnPayloadFields = serde_json::from_value(payload).unwrap_or_default();

        let Some(tracking_id) = fields.tracking_id else {
            let err = NotificationError::MissingTrackingId;
            warn!(
                log_id,
                status = err.status_code().as_u16(),
                "notifications: no tracking id in payload"
            );
            self.ipn_log_repo
                .set_note(log_id, "no tracking id in payload")
                .await
                .map_err(NotificationError::Internal)?;
            return Err(err);
        };

        // Never trust the pushed payload: confirmation always comes from a
        // direct status query back to the gateway.
        let live_status = match self.gateway.transaction_status(&tracking_id).await {
            Ok(status) => status,
            Err(err) => {
                error!(
                    log_id,
                    tracking_id = %tracking_id,
                    error = ?err,
                    "notifications: live status query failed"
                );
                self.ipn_log_repo
                    .set_note(
                        log_id,
                        &format!("failed to fetch transaction status: {err:#}"),
                    )
                    .await
                    .map_err(NotificationError::Internal)?;
                return Err(NotificationError::VerificationFailed(err));
            }
        };

        let verified_status = live_status
            .status
            .clone()
            .unwrap_or_else(|| "UNKNOWN".to_string());
        self.ipn_log_repo
            .mark_processed(log_id, &format!("verified status: {verified_status}"))
            .await
            .map_err(NotificationError::Internal)?;

        if !live_status.is_completed() {
            info!(
                log_id,
                tracking_id = %tracking_id,
                verified_status = %verified_status,
                "notifications: payment not completed; acknowledged"
            );
            return Ok(IpnOutcome::PaymentNotCompleted);
        }

        let merchant_reference = fields
            .merchant_reference
            .or_else(|| live_status.merchant_reference.clone());

        let order = match merchant_reference.as_deref() {
            Some(reference) => self
                .order_repo
                .find_by_merchant_reference(reference)
                .await
                .map_err(|err| {
                    error!(
                        log_id,
                        merchant_reference = reference,
                        db_error = ?err,
                        "notifications: order lookup by merchant reference failed"
                    );
                    NotificationError::Internal(err)
                })?,
            None => None,
        };

        // The gateway does not reliably echo the original reference; fall
        // back to the tracking id before giving up.
        let order = match order {
            Some(order) => order,
            None => self
                .order_repo
                .find_by_tracking_id(&tracking_id)
                .await
                .map_err(|err| {
                    error!(
                        log_id,
                        tracking_id = %tracking_id,
                        db_error = ?err,
                        "notifications: order lookup by tracking id failed"
                    );
                    NotificationError::Internal(err)
                })?
                .ok_or_else(|| {
                    let err = NotificationError::OrderNotFound;
                    warn!(
                        log_id,
                        tracking_id = %tracking_id,
                        merchant_reference = ?merchant_reference,
                        status = err.status_code().as_u16(),
                        "notifications: no order matches the notification"
                    );
                    err
                })?,
        };

        let transitioned = self
            .order_repo
            .mark_completed(order.id, &tracking_id)
            .await
            .map_err(|err| {
                error!(
                    log_id,
                    order_id = order.id,
                    db_error = ?err,
                    "notifications: failed to complete order"
                );
                NotificationError::Internal(err)
            })?;

        if !transitioned {
            info!(
                log_id,
                order_id = order.id,
                "notifications: order already completed; redelivery is a no-op"
            );
            return Ok(IpnOutcome::AlreadyProcessed);
        }

        let plan = self
            .plan_repo
            .find_by_id(order.plan_id)
            .await
            .map_err(|err| {
                error!(
                    log_id,
                    order_id = order.id,
                    plan_id = order.plan_id,
                    db_error = ?err,
                    "notifications: failed to load plan for completed order"
                );
                NotificationError::Internal(err)
            })?
            .ok_or_else(|| {
                NotificationError::Internal(anyhow::anyhow!(
                    "plan {} missing for order {}",
                    order.plan_id,
                    order.id
                ))
            })?;

        let subscription = self
            .subscription_repo
            .activate_period(
                order.user_id,
                plan.id,
                plan.duration_days,
                Some(tracking_id.clone()),
            )
            .await
            .map_err(|err| {
                error!(
                    log_id,
                    order_id = order.id,
                    user_id = %order.user_id,
                    db_error = ?err,
                    "notifications: failed to activate subscription period"
                );
                NotificationError::Internal(err)
            })?;

        info!(
            log_id,
            order_id = order.id,
            user_id = %order.user_id,
            subscription_id = subscription.id,
            starts_at = %subscription.starts_at,
            ends_at = %subscription.ends_at,
            "notifications: subscription period activated"
        );

        Ok(IpnOutcome::SubscriptionActivated)
    }
}
