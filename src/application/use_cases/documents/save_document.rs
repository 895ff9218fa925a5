use tracing::debug;
use uuid::Uuid;

use crate::application::errors::{DocumentError, SaveConflict};
use crate::application::ports::document_repository::{AppendOutcome, DocumentRepository};
use crate::domain::documents::document::{NewRevision, Revision};

pub struct SaveDocument<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DocumentRepository + ?Sized> SaveDocument<'a, R> {
    /// Appends `new_body` only if `base_revision_id` is still the document's
    /// current revision. A stale base yields `DocumentError::Conflict` with
    /// both versions and leaves the document untouched; it is never retried.
    pub async fn execute(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        new_body: &str,
        message: &str,
        base_revision_id: Uuid,
        actor: Uuid,
    ) -> Result<Revision, DocumentError> {
        let rev = NewRevision {
            body: new_body.to_string(),
            message: message.to_string(),
            created_by: actor,
        };
        match self
            .repo
            .append_if_current(tenant_id, document_id, base_revision_id, &rev)
            .await?
        {
            AppendOutcome::Committed(revision) => {
                debug!(%tenant_id, %document_id, revision_id = %revision.id, "document_saved");
                Ok(revision)
            }
            AppendOutcome::Stale(current) => {
                debug!(
                    %tenant_id,
                    %document_id,
                    base = %base_revision_id,
                    current = %current.id,
                    "document_save_conflict"
                );
                Err(DocumentError::Conflict(Box::new(SaveConflict {
                    attempted_body: rev.body,
                    attempted_message: rev.message,
                    base_revision_id,
                    current,
                })))
            }
            AppendOutcome::Missing => Err(DocumentError::NotFound),
        }
    }
}
