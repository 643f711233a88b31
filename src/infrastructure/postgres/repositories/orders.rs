use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use crate::{
    domain::{
        entities::orders::{InsertOrderEntity, OrderEntity},
        repositories::orders::OrderRepository,
        value_objects::enums::order_statuses::OrderStatus,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::pesapal_orders},
};

pub struct OrderPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl OrderPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl OrderRepository for OrderPostgres {
    async fn create_order(&self, insert_order_entity: InsertOrderEntity) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = diesel::insert_into(pesapal_orders::table)
            .values(&insert_order_entity)
            .returning(pesapal_orders::id)
            .get_result::<i64>(&mut conn)?;

        Ok(result)
    }

    async fn find_by_merchant_reference(
        &self,
        merchant_reference: &str,
    ) -> Result<Option<OrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = pesapal_orders::table
            .filter(pesapal_orders::merchant_reference.eq(merchant_reference))
            .select(OrderEntity::as_select())
            .first::<OrderEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_tracking_id(&self, tracking_id: &str) -> Result<Option<OrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = pesapal_orders::table
            .filter(pesapal_orders::tracking_id.eq(tracking_id))
            .select(OrderEntity::as_select())
            .first::<OrderEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn mark_completed(&self, order_id: i64, tracking_id: &str) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Conditional transition: a completed order never regresses, and a
        // redelivered notification observes zero updated rows.
        let updated = diesel::update(
            pesapal_orders::table
                .find(order_id)
                .filter(pesapal_orders::status.ne(OrderStatus::Completed.to_string())),
        )
        .set((
            pesapal_orders::status.eq(OrderStatus::Completed.to_string()),
            pesapal_orders::tracking_id.eq(Some(tracking_id)),
            pesapal_orders::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(updated > 0)
    }
}
