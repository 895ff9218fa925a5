use uuid::Uuid;

use crate::application::errors::DocumentError;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::documents::document::RevisionSummary;

pub struct ListRevisions<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DocumentRepository + ?Sized> ListRevisions<'a, R> {
    // Newest first
    pub async fn execute(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> Result<Vec<RevisionSummary>, DocumentError> {
        if self.repo.get(tenant_id, document_id).await?.is_none() {
            return Err(DocumentError::NotFound);
        }
        Ok(self.repo.list_revisions(tenant_id, document_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::documents::save_document::SaveDocument;
    use crate::application::use_cases::documents::test_support::seed;
    use crate::infrastructure::memory::InMemoryStore;

    #[tokio::test]
    async fn lists_newest_first() {
        let store = InMemoryStore::new();
        let tenant = Uuid::new_v4();
        let (doc, first) = seed(&store, tenant, "a", "v1").await;
        let second = SaveDocument { repo: &store }
            .execute(tenant, doc.id, "v2", "second", first.id, Uuid::new_v4())
            .await
            .unwrap();
        let list = ListRevisions { repo: &store }
            .execute(tenant, doc.id)
            .await
            .unwrap();
        let ids: Vec<Uuid> = list.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(list[0].base_revision_id, Some(first.id));
    }

    #[tokio::test]
    async fn unknown_document_is_not_found() {
        let store = InMemoryStore::new();
        let err = ListRevisions { repo: &store }
            .execute(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::NotFound));
    }
}
