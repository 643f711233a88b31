use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use crate::application::usecases::{
    gateway::PesapalGateway,
    notifications::NotificationUseCase,
    orders::OrderUseCase,
    status_check::StatusCheckUseCase,
};
use crate::auth::AuthUser;
use crate::config::config_model::DotEnvyConfig;
use crate::domain::repositories::{
    ipn_logs::IpnLogRepository, orders::OrderRepository, plans::PlanRepository,
    subscriptions::SubscriptionRepository,
};
use crate::domain::value_objects::{
    ipn::RegisterIpnModel,
    orders::{CheckStatusModel, CreateOrderModel},
};
use crate::infrastructure::axum_http::error_responses::error_response;
use crate::infrastructure::pesapal::client::PesapalClient;
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{
        ipn_logs::IpnLogPostgres, orders::OrderPostgres, plans::PlanPostgres,
        subscriptions::SubscriptionPostgres,
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let gateway = Arc::new(PesapalClient::new(&config.pesapal));

    let plan_repo = Arc::new(PlanPostgres::new(Arc::clone(&db_pool)));
    let order_repo = Arc::new(OrderPostgres::new(Arc::clone(&db_pool)));
    let subscription_repo = Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool)));
    let ipn_log_repo = Arc::new(IpnLogPostgres::new(Arc::clone(&db_pool)));

    let orders_usecase = OrderUseCase::new(
        Arc::clone(&plan_repo),
        Arc::clone(&order_repo),
        Arc::clone(&gateway),
        config.pesapal.ipn_id.clone(),
        config.pesapal.callback_url.clone(),
    );
    let notifications_usecase = NotificationUseCase::new(
        Arc::clone(&order_repo),
        plan_repo,
        subscription_repo,
        ipn_log_repo,
        Arc::clone(&gateway),
    );
    let status_check_usecase = StatusCheckUseCase::new(order_repo, gateway);

    Router::new()
        .route("/create", post(create_order))
        .route("/register-ipn", post(register_ipn))
        .with_state(Arc::new(orders_usecase))
        .merge(
            Router::new()
                .route("/ipn", post(handle_ipn))
                .with_state(Arc::new(notifications_usecase)),
        )
        .merge(
            Router::new()
                .route("/check", post(check_status))
                .with_state(Arc::new(status_check_usecase)),
        )
}

pub async fn create_order<P, O, G>(
    State(orders_usecase): State<Arc<OrderUseCase<P, O, G>>>,
    auth: AuthUser,
    Json(create_order_model): Json<CreateOrderModel>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    G: PesapalGateway + Send + Sync + 'static,
{
    match orders_usecase
        .create_order(auth.user_id, auth.email, create_order_model.plan_id)
        .await
    {
        Ok(created_order) => (StatusCode::OK, Json(created_order)).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

/// Operator utility: registers the IPN callback URL with the gateway and
/// returns the registration for the notification id to be persisted to
/// configuration.
pub async fn register_ipn<P, O, G>(
    State(orders_usecase): State<Arc<OrderUseCase<P, O, G>>>,
    body: Option<Json<RegisterIpnModel>>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    G: PesapalGateway + Send + Sync + 'static,
{
    let register_ipn_model = body.map(|Json(model)| model).unwrap_or_default();

    match orders_usecase
        .register_ipn(register_ipn_model.callback_url)
        .await
    {
        Ok(registration) => (StatusCode::OK, Json(registration.raw)).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn handle_ipn<O, P, S, L, G>(
    State(notifications_usecase): State<Arc<NotificationUseCase<O, P, S, L, G>>>,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    L: IpnLogRepository + Send + Sync + 'static,
    G: PesapalGateway + Send + Sync + 'static,
{
    match notifications_usecase.handle_ipn(payload).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": outcome.message() })),
        )
            .into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn check_status<O, G>(
    State(status_check_usecase): State<Arc<StatusCheckUseCase<O, G>>>,
    _auth: AuthUser,
    Json(check_status_model): Json<CheckStatusModel>,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync + 'static,
    G: PesapalGateway + Send + Sync + 'static,
{
    match status_check_usecase
        .check_status(&check_status_model.merchant_reference)
        .await
    {
        Ok(status) => (StatusCode::OK, Json(status.raw)).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}
