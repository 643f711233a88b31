use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::define_sql_function;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use uuid::Uuid;

use crate::{
    domain::{
        entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
        repositories::subscriptions::SubscriptionRepository,
        value_objects::subscriptions::next_entitlement_period,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions},
};

define_sql_function! {
    fn pg_advisory_xact_lock(key: BigInt);
}

/// Advisory lock key derived from the user id, so activations for one user
/// serialize while different users proceed concurrently.
fn user_lock_key(user_id: Uuid) -> i64 {
    let bytes = user_id.as_bytes();
    i64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn activate_period(
        &self,
        user_id: Uuid,
        plan_id: i64,
        duration_days: i32,
        gateway_correlation_id: Option<String>,
    ) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let subscription = conn.transaction::<SubscriptionEntity, anyhow::Error, _>(|conn| {
            // Near-simultaneous completed payments for the same user must
            // stack, not overlap: hold the per-user lock for the whole
            // find-then-insert.
            diesel::select(pg_advisory_xact_lock(user_lock_key(user_id))).execute(conn)?;

            let prior_ends_at = subscriptions::table
                .filter(subscriptions::user_id.eq(user_id))
                .filter(subscriptions::active.eq(true))
                .filter(subscriptions::ends_at.gt(now))
                .order(subscriptions::ends_at.desc())
                .select(subscriptions::ends_at)
                .first::<DateTime<Utc>>(conn)
                .optional()?;

            let (starts_at, ends_at) = next_entitlement_period(prior_ends_at, now, duration_days)?;

            let inserted = diesel::insert_into(subscriptions::table)
                .values(&InsertSubscriptionEntity {
                    user_id,
                    plan_id,
                    starts_at,
                    ends_at,
                    active: true,
                    gateway_correlation_id: gateway_correlation_id.clone(),
                    frequency: None,
                    next_payment_date: None,
                })
                .returning(SubscriptionEntity::as_select())
                .get_result::<SubscriptionEntity>(conn)?;

            Ok(inserted)
        })?;

        Ok(subscription)
    }
}
