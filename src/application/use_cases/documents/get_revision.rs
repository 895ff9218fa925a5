use uuid::Uuid;

use crate::application::errors::DocumentError;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::document::Revision;

pub struct GetRevision<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DocumentRepository + ?Sized> GetRevision<'a, R> {
    pub async fn execute(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        revision_id: Uuid,
    ) -> Result<Revision, DocumentError> {
        self.repo
            .get_revision(tenant_id, document_id, revision_id)
            .await?
            .ok_or(DocumentError::NotFound)
    }
}
