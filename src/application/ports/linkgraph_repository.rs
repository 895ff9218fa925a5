use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::documents::document::{BacklinkInfo, BrokenLink, LinkEdge};

#[async_trait]
pub trait LinkGraphRepository: Send + Sync {
    async fn find_document_id_by_path(
        &self,
        tenant_id: Uuid,
        path: &str,
    ) -> anyhow::Result<Option<Uuid>>;

    /// Deletes every outbound edge of `from_document_id` and inserts `edges`
    /// (in order) within one transaction, holding the same row lock a save
    /// takes. Nothing is written, and false is returned, unless `revision_id`
    /// is still the document's current revision.
    async fn replace_outbound(
        &self,
        tenant_id: Uuid,
        from_document_id: Uuid,
        revision_id: Uuid,
        edges: &[LinkEdge],
    ) -> anyhow::Result<bool>;

    // Returns the number of edges touched
    async fn mark_path_broken(&self, tenant_id: Uuid, path: &str) -> anyhow::Result<u64>;

    async fn outgoing(&self, tenant_id: Uuid, from_document_id: Uuid)
    -> anyhow::Result<Vec<LinkEdge>>;

    async fn backlinks(&self, tenant_id: Uuid, target_id: Uuid)
    -> anyhow::Result<Vec<BacklinkInfo>>;

    async fn broken_links(&self, tenant_id: Uuid) -> anyhow::Result<Vec<BrokenLink>>;
}
