use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::application::errors::DocumentError;
use crate::application::linkgraph::rebuild_links;
use crate::application::ports::audit_sink::AuditSink;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::linkgraph_repository::LinkGraphRepository;
use crate::application::use_cases::documents::save_document::SaveDocument;
use crate::domain::documents::document::Revision;

/// Save, then bring the link graph and audit log up to date. Only the save
/// decides the outcome; once it has committed, follow-up failures are logged.
pub struct EditDocument<'a, R, L, A>
where
    R: DocumentRepository + ?Sized,
    L: LinkGraphRepository + ?Sized,
    A: AuditSink + ?Sized,
{
    pub repo: &'a R,
    pub links: &'a L,
    pub audit: &'a A,
}

impl<'a, R, L, A> EditDocument<'a, R, L, A>
where
    R: DocumentRepository + ?Sized,
    L: LinkGraphRepository + ?Sized,
    A: AuditSink + ?Sized,
{
    pub async fn execute(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        new_body: &str,
        message: &str,
        base_revision_id: Uuid,
        actor: Uuid,
    ) -> Result<Revision, DocumentError> {
        let revision = SaveDocument { repo: self.repo }
            .execute(tenant_id, document_id, new_body, message, base_revision_id, actor)
            .await?;
        after_commit(
            self.repo,
            self.links,
            self.audit,
            &revision,
            actor,
            "doc.edit",
            json!({ "revision_id": revision.id }),
        )
        .await;
        Ok(revision)
    }
}

pub(crate) async fn after_commit<R, L, A>(
    repo: &R,
    links: &L,
    audit: &A,
    revision: &Revision,
    actor: Uuid,
    action: &str,
    metadata: serde_json::Value,
) where
    R: DocumentRepository + ?Sized,
    L: LinkGraphRepository + ?Sized,
    A: AuditSink + ?Sized,
{
    let tenant_id = revision.tenant_id;
    let document_id = revision.document_id;
    match repo.get(tenant_id, document_id).await {
        Ok(Some(doc)) => {
            let rebuilt = rebuild_links(
                links,
                tenant_id,
                document_id,
                &doc.path,
                revision.id,
                &revision.body,
            )
            .await;
            if let Err(e) = rebuilt {
                warn!(%tenant_id, %document_id, error = ?e, "link_rebuild_failed");
            }
        }
        Ok(None) => warn!(%tenant_id, %document_id, "link_rebuild_skipped_missing_document"),
        Err(e) => warn!(%tenant_id, %document_id, error = ?e, "link_rebuild_failed"),
    }
    if let Err(e) = audit
        .log(tenant_id, actor, action, "document", document_id, metadata)
        .await
    {
        warn!(%tenant_id, %document_id, action, error = ?e, "audit_log_failed");
    }
}
