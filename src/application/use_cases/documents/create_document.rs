use tracing::debug;
use uuid::Uuid;

use crate::application::errors::DocumentError;
use crate::application::linkgraph::normalize_document_path;
use crate::application::ports::document_repository::{CreateOutcome, DocumentRepository};
use crate::domain::documents::document::{Document, NewDocument, NewRevision, Revision};

pub struct CreateDocument<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DocumentRepository + ?Sized> CreateDocument<'a, R> {
    /// Creates the document together with its first revision, which has no base.
    pub async fn execute(
        &self,
        tenant_id: Uuid,
        mut doc: NewDocument,
        body: &str,
        message: &str,
        actor: Uuid,
    ) -> Result<(Document, Revision), DocumentError> {
        doc.path = normalize_document_path(&doc.path)
            .ok_or_else(|| DocumentError::InvalidPath(doc.path.clone()))?;
        let first = NewRevision {
            body: body.to_string(),
            message: message.to_string(),
            created_by: actor,
        };
        match self.repo.create_with_revision(tenant_id, &doc, &first).await? {
            CreateOutcome::Created(document, revision) => {
                debug!(
                    %tenant_id,
                    document_id = %document.id,
                    revision_id = %revision.id,
                    "document_created"
                );
                Ok((document, revision))
            }
            CreateOutcome::PathTaken => Err(DocumentError::PathTaken(doc.path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::documents::test_support::new_doc;
    use crate::infrastructure::memory::InMemoryStore;

    #[tokio::test]
    async fn first_revision_has_no_base() {
        let store = InMemoryStore::new();
        let tenant = Uuid::new_v4();
        let (doc, rev) = CreateDocument { repo: &store }
            .execute(tenant, new_doc("/team/page.md"), "hello", "create", Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(doc.path, "team/page");
        assert_eq!(doc.current_revision_id, rev.id);
        assert_eq!(rev.base_revision_id, None);
        assert_eq!(rev.document_id, doc.id);
        assert_eq!(rev.tenant_id, tenant);
    }

    #[tokio::test]
    async fn path_is_unique_per_tenant() {
        let store = InMemoryStore::new();
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let uc = CreateDocument { repo: &store };
        uc.execute(t1, new_doc("a/b"), "", "", Uuid::new_v4())
            .await
            .unwrap();
        let err = uc
            .execute(t1, new_doc("a/b"), "", "", Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::PathTaken(p) if p == "a/b"));
        assert!(uc.execute(t2, new_doc("a/b"), "", "", Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_empty_path() {
        let store = InMemoryStore::new();
        let err = CreateDocument { repo: &store }
            .execute(Uuid::new_v4(), new_doc(" / "), "", "", Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidPath(_)));
    }
}
