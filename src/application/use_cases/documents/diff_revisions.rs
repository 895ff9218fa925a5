use uuid::Uuid;

use crate::application::errors::DocumentError;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::services::diff::{DiffResult, compute_diff};

pub struct DiffRevisions<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DocumentRepository + ?Sized> DiffRevisions<'a, R> {
    /// Line diff from `from_revision_id` to `to_revision_id`; both must belong
    /// to the document.
    pub async fn execute(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        from_revision_id: Uuid,
        to_revision_id: Uuid,
    ) -> Result<DiffResult, DocumentError> {
        let from = self
            .repo
            .get_revision(tenant_id, document_id, from_revision_id)
            .await?
            .ok_or(DocumentError::NotFound)?;
        let to = self
            .repo
            .get_revision(tenant_id, document_id, to_revision_id)
            .await?
            .ok_or(DocumentError::NotFound)?;
        Ok(compute_diff(&from.body, &to.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::diff::DiffOp;
    use crate::application::use_cases::documents::save_document::SaveDocument;
    use crate::application::use_cases::documents::test_support::seed;
    use crate::infrastructure::memory::InMemoryStore;

    #[tokio::test]
    async fn diffs_two_revisions() {
        let store = InMemoryStore::new();
        let tenant = Uuid::new_v4();
        let (doc, first) = seed(&store, tenant, "a", "line one\nline two\n").await;
        let second = SaveDocument { repo: &store }
            .execute(tenant, doc.id, "line one\nline 2\n", "edit", first.id, Uuid::new_v4())
            .await
            .unwrap();
        let uc = DiffRevisions { repo: &store };
        let diff = uc.execute(tenant, doc.id, first.id, second.id).await.unwrap();
        assert_eq!(diff.deleted_lines(), 1);
        assert_eq!(diff.inserted_lines(), 1);
        assert_eq!(diff.segments[0].op, DiffOp::Equal);

        let same = uc.execute(tenant, doc.id, second.id, second.id).await.unwrap();
        assert!(same.is_identical());
    }

    #[tokio::test]
    async fn foreign_revision_is_not_found() {
        let store = InMemoryStore::new();
        let tenant = Uuid::new_v4();
        let (doc_a, rev_a) = seed(&store, tenant, "a", "a").await;
        let (_, rev_b) = seed(&store, tenant, "b", "b").await;
        let err = DiffRevisions { repo: &store }
            .execute(tenant, doc_a.id, rev_a.id, rev_b.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::NotFound));
    }
}
