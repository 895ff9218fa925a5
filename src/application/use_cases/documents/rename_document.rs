use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::errors::DocumentError;
use crate::application::linkgraph::{mark_path_broken, normalize_document_path};
use crate::application::ports::document_repository::{DocumentRepository, RenameOutcome};
use crate::application::ports::linkgraph_repository::LinkGraphRepository;
use crate::domain::documents::document::Document;

pub struct RenameDocument<'a, R, L>
where
    R: DocumentRepository + ?Sized,
    L: LinkGraphRepository + ?Sized,
{
    pub repo: &'a R,
    pub links: &'a L,
}

impl<'a, R, L> RenameDocument<'a, R, L>
where
    R: DocumentRepository + ?Sized,
    L: LinkGraphRepository + ?Sized,
{
    /// Moves a document to `new_path`. Edges that pointed at the old path are
    /// flagged broken; they heal when their source documents are next saved.
    pub async fn execute(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        new_path: &str,
    ) -> Result<Document, DocumentError> {
        let path = normalize_document_path(new_path)
            .ok_or_else(|| DocumentError::InvalidPath(new_path.to_string()))?;
        match self.repo.rename(tenant_id, document_id, &path).await? {
            RenameOutcome::Renamed { document, old_path } => {
                if old_path != document.path {
                    if let Err(e) = mark_path_broken(self.links, tenant_id, &old_path).await {
                        warn!(
                            %tenant_id,
                            %document_id,
                            old_path = %old_path,
                            error = ?e,
                            "mark_path_broken_failed"
                        );
                    }
                }
                debug!(
                    %tenant_id,
                    %document_id,
                    old_path = %old_path,
                    new_path = %document.path,
                    "document_renamed"
                );
                Ok(document)
            }
            RenameOutcome::PathTaken => Err(DocumentError::PathTaken(path)),
            RenameOutcome::Missing => Err(DocumentError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::linkgraph::rebuild_links;
    use crate::application::use_cases::documents::test_support::seed;
    use crate::infrastructure::memory::InMemoryStore;

    #[tokio::test]
    async fn rename_breaks_inbound_links() {
        let store = InMemoryStore::new();
        let tenant = Uuid::new_v4();
        let (target, _) = seed(&store, tenant, "team/target", "").await;
        let (source, rev) = seed(&store, tenant, "team/source", "").await;
        rebuild_links(&store, tenant, source.id, &source.path, rev.id, "[t](target)")
            .await
            .unwrap();

        let renamed = RenameDocument { repo: &store, links: &store }
            .execute(tenant, target.id, "/team/moved.md")
            .await
            .unwrap();
        assert_eq!(renamed.path, "team/moved");

        let edges = store.outgoing(tenant, source.id).await.unwrap();
        assert!(edges[0].broken);
        assert_eq!(edges[0].to_document_id, None);
        assert!(store.backlinks(tenant, target.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rename_onto_existing_path_fails() {
        let store = InMemoryStore::new();
        let tenant = Uuid::new_v4();
        let (a, _) = seed(&store, tenant, "a", "").await;
        seed(&store, tenant, "b", "").await;
        let err = RenameDocument { repo: &store, links: &store }
            .execute(tenant, a.id, "b")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::PathTaken(_)));
    }
}
