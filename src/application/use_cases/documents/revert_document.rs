use tracing::debug;
use uuid::Uuid;

use crate::application::errors::DocumentError;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::document::{NewRevision, Revision};

pub struct RevertDocument<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

pub fn revert_message(target_revision_id: Uuid) -> String {
    format!("Revert to revision {target_revision_id}")
}

impl<'a, R: DocumentRepository + ?Sized> RevertDocument<'a, R> {
    /// Appends a copy of `target_revision_id`'s body as a new revision on top
    /// of whatever is current. History is only ever extended.
    pub async fn execute(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        target_revision_id: Uuid,
        actor: Uuid,
    ) -> Result<Revision, DocumentError> {
        let target = self
            .repo
            .get_revision(tenant_id, document_id, target_revision_id)
            .await?
            .ok_or(DocumentError::NotFound)?;
        let rev = NewRevision {
            body: target.body,
            message: revert_message(target_revision_id),
            created_by: actor,
        };
        let revision = self
            .repo
            .append_at_head(tenant_id, document_id, &rev)
            .await?
            .ok_or(DocumentError::NotFound)?;
        debug!(
            %tenant_id,
            %document_id,
            reverted_from = %target_revision_id,
            revision_id = %revision.id,
            "document_reverted"
        );
        Ok(revision)
    }
}
