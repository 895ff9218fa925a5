use serde_json::json;
use uuid::Uuid;

use crate::application::errors::DocumentError;
use crate::application::ports::audit_sink::AuditSink;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::linkgraph_repository::LinkGraphRepository;
use crate::application::use_cases::documents::edit_document::after_commit;
use crate::application::use_cases::documents::revert_document::RevertDocument;
use crate::domain::documents::document::Revision;

pub struct RevertDocumentWorkflow<'a, R, L, A>
where
    R: DocumentRepository + ?Sized,
    L: LinkGraphRepository + ?Sized,
    A: AuditSink + ?Sized,
{
    pub repo: &'a R,
    pub links: &'a L,
    pub audit: &'a A,
}

impl<'a, R, L, A> RevertDocumentWorkflow<'a, R, L, A>
where
    R: DocumentRepository + ?Sized,
    L: LinkGraphRepository + ?Sized,
    A: AuditSink + ?Sized,
{
    pub async fn execute(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        target_revision_id: Uuid,
        actor: Uuid,
    ) -> Result<Revision, DocumentError> {
        let revision = RevertDocument { repo: self.repo }
            .execute(tenant_id, document_id, target_revision_id, actor)
            .await?;
        after_commit(
            self.repo,
            self.links,
            self.audit,
            &revision,
            actor,
            "doc.revert",
            json!({ "revision_id": revision.id, "reverted_from": target_revision_id }),
        )
        .await;
        Ok(revision)
    }
}
