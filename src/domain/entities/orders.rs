use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::pesapal_orders;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = pesapal_orders)]
pub struct OrderEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub plan_id: i64,
    pub merchant_reference: String,
    pub tracking_id: Option<String>,
    pub amount_minor: i32,
    pub status: String,
    pub checkout_url: Option<String>,
    pub is_recurring: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pesapal_orders)]
pub struct InsertOrderEntity {
    pub user_id: Uuid,
    pub plan_id: i64,
    pub merchant_reference: String,
    pub tracking_id: Option<String>,
    pub amount_minor: i32,
    pub status: String,
    pub checkout_url: Option<String>,
    pub is_recurring: bool,
}
