use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

#[async_trait]
#[automock]
pub trait IpnLogRepository {
    /// Appends the raw notification payload to the audit log. Called before
    /// any processing so no notification is lost.
    async fn record_payload(&self, payload: serde_json::Value) -> Result<i64>;
    async fn set_note(&self, log_id: i64, note: &str) -> Result<()>;
    async fn mark_processed(&self, log_id: i64, note: &str) -> Result<()>;
}
