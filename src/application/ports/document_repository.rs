use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::documents::document::{
    Document, NewDocument, NewRevision, Revision, RevisionSummary,
};

#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(Document, Revision),
    PathTaken,
}

#[derive(Debug, Clone)]
pub enum AppendOutcome {
    Committed(Revision),
    /// Current pointer moved on; carries the revision that is live now.
    Stale(Revision),
    Missing,
}

#[derive(Debug, Clone)]
pub enum RenameOutcome {
    Renamed { document: Document, old_path: String },
    PathTaken,
    Missing,
}

/// Document aggregate plus its append-only revision ledger.
///
/// Every method is tenant-scoped; a row belonging to another tenant behaves
/// exactly like a missing one.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create_with_revision(
        &self,
        tenant_id: Uuid,
        doc: &NewDocument,
        first: &NewRevision,
    ) -> anyhow::Result<CreateOutcome>;

    async fn get(&self, tenant_id: Uuid, id: Uuid) -> anyhow::Result<Option<Document>>;

    async fn find_by_path(&self, tenant_id: Uuid, path: &str) -> anyhow::Result<Option<Document>>;

    async fn get_revision(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        revision_id: Uuid,
    ) -> anyhow::Result<Option<Revision>>;

    // Newest first
    async fn list_revisions(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> anyhow::Result<Vec<RevisionSummary>>;

    /// Compare-and-repoint: inserts the revision and moves the current pointer
    /// only while it still equals `expected_current`. Must be one atomic unit.
    async fn append_if_current(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        expected_current: Uuid,
        rev: &NewRevision,
    ) -> anyhow::Result<AppendOutcome>;

    /// Appends on top of whatever is current at commit time, recording that
    /// revision as the base. Returns None when the document does not exist.
    async fn append_at_head(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        rev: &NewRevision,
    ) -> anyhow::Result<Option<Revision>>;

    async fn rename(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        new_path: &str,
    ) -> anyhow::Result<RenameOutcome>;
}
