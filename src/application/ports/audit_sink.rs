use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log(
        &self,
        tenant_id: Uuid,
        actor: Uuid,
        action: &str,
        target_type: &str,
        target_id: Uuid,
        metadata: serde_json::Value,
    ) -> anyhow::Result<()>;
}
