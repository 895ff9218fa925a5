pub mod create_document;
pub mod diff_revisions;
pub mod edit_document;
pub mod get_backlinks;
pub mod get_broken_links;
pub mod get_document;
pub mod get_outgoing_links;
pub mod get_revision;
pub mod list_revisions;
pub mod rename_document;
pub mod render_document;
pub mod revert_document;
pub mod revert_workflow;
pub mod save_document;

#[cfg(test)]
pub(crate) mod test_support {
    use uuid::Uuid;

    use crate::application::ports::document_repository::{CreateOutcome, DocumentRepository};
    use crate::domain::documents::document::{Document, NewDocument, NewRevision, Revision};
    use crate::infrastructure::memory::InMemoryStore;

    pub fn new_doc(path: &str) -> NewDocument {
        NewDocument {
            path: path.to_string(),
            title: path.to_string(),
            doc_type: "page".to_string(),
            sensitivity: "internal".to_string(),
            owner: Uuid::new_v4(),
            client_id: None,
        }
    }

    pub async fn seed(
        store: &InMemoryStore,
        tenant_id: Uuid,
        path: &str,
        body: &str,
    ) -> (Document, Revision) {
        let doc = new_doc(path);
        let first = NewRevision {
            body: body.to_string(),
            message: "create".to_string(),
            created_by: doc.owner,
        };
        match store.create_with_revision(tenant_id, &doc, &first).await {
            Ok(CreateOutcome::Created(d, r)) => (d, r),
            other => panic!("seed {path} failed: {other:?}"),
        }
    }
}
