use uuid::Uuid;

use crate::application::errors::DocumentError;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::document::{Document, Revision};

pub struct GetDocument<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DocumentRepository + ?Sized> GetDocument<'a, R> {
    pub async fn execute(&self, tenant_id: Uuid, id: Uuid) -> Result<Document, DocumentError> {
        self.repo
            .get(tenant_id, id)
            .await?
            .ok_or(DocumentError::NotFound)
    }

    /// Document plus the revision its current pointer names.
    pub async fn with_current(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<(Document, Revision), DocumentError> {
        let doc = self.execute(tenant_id, id).await?;
        let rev = self
            .repo
            .get_revision(tenant_id, id, doc.current_revision_id)
            .await?
            .ok_or_else(|| {
                DocumentError::Store(anyhow::anyhow!(
                    "current revision {} of document {} is missing",
                    doc.current_revision_id,
                    id
                ))
            })?;
        Ok((doc, rev))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::documents::test_support::seed;
    use crate::infrastructure::memory::InMemoryStore;

    #[tokio::test]
    async fn returns_current_body() {
        let store = InMemoryStore::new();
        let tenant = Uuid::new_v4();
        let (doc, first) = seed(&store, tenant, "a", "v1").await;
        let (got, rev) = GetDocument { repo: &store }
            .with_current(tenant, doc.id)
            .await
            .unwrap();
        assert_eq!(got.id, doc.id);
        assert_eq!(rev, first);
    }

    #[tokio::test]
    async fn cross_tenant_is_not_found() {
        let store = InMemoryStore::new();
        let (doc, _) = seed(&store, Uuid::new_v4(), "a", "v1").await;
        let err = GetDocument { repo: &store }
            .execute(Uuid::new_v4(), doc.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::NotFound));
    }
}
