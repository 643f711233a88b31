use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infrastructure::postgres::schema::ipn_logs;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = ipn_logs)]
pub struct IpnLogEntity {
    pub id: i64,
    pub payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
    pub processed: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ipn_logs)]
pub struct InsertIpnLogEntity {
    pub payload: serde_json::Value,
    pub processed: bool,
    pub note: Option<String>,
}
