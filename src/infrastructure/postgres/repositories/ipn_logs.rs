use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;

use crate::{
    domain::{entities::ipn_logs::InsertIpnLogEntity, repositories::ipn_logs::IpnLogRepository},
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::ipn_logs},
};

pub struct IpnLogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl IpnLogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl IpnLogRepository for IpnLogPostgres {
    async fn record_payload(&self, payload: serde_json::Value) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = diesel::insert_into(ipn_logs::table)
            .values(&InsertIpnLogEntity {
                payload,
                processed: false,
                note: None,
            })
            .returning(ipn_logs::id)
            .get_result::<i64>(&mut conn)?;

        Ok(result)
    }

    async fn set_note(&self, log_id: i64, note: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(ipn_logs::table.find(log_id))
            .set(ipn_logs::note.eq(Some(note)))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_processed(&self, log_id: i64, note: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(ipn_logs::table.find(log_id))
            .set((
                ipn_logs::processed.eq(true),
                ipn_logs::note.eq(Some(note)),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
