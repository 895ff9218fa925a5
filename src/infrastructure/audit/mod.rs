use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::audit_sink::AuditSink;

/// Emits audit entries as structured `tracing` events under the `audit`
/// target, for deployments where the log pipeline is the audit store.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn log(
        &self,
        tenant_id: Uuid,
        actor: Uuid,
        action: &str,
        target_type: &str,
        target_id: Uuid,
        metadata: serde_json::Value,
    ) -> anyhow::Result<()> {
        tracing::info!(
            target: "audit",
            %tenant_id,
            %actor,
            action,
            target_type,
            %target_id,
            metadata = %metadata,
            "audit_entry"
        );
        Ok(())
    }
}
